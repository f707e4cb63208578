use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use crate::timecode::DisplayZone;

pub const DEFAULT_BASE_URL: &str = "https://www.plurk.com";

/// Output file format; the extension doubles as the CLI spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportFormat {
    Txt,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(ExportFormat::Txt),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown format {other:?} (expected txt, json or csv)")),
        }
    }
}

/// Network and pagination options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct DownloadOptions {
    pub base_url: String,            // scheme + host, no trailing slash
    pub request_timeout: Duration,   // per request, connect included
    pub max_pages: u64,              // watchdog: hard stop after this many pages
    pub retries: u32,                // extra attempts on transport failures only
    pub retry_delay_ms: u64,         // linear backoff step
    pub user_agent: String,
    pub progress: bool,              // show spinner
    pub progress_label: Option<String>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            // 20 posts per page, so this is roughly a million posts
            max_pages: 50_000,
            retries: 2,
            retry_delay_ms: 500,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            progress: true,
            progress_label: None,
        }
    }
}

impl DownloadOptions {
    pub fn with_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = url.as_ref().trim().trim_end_matches('/').to_string();
        self
    }
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout.max(Duration::from_secs(1));
        self
    }
    pub fn with_max_pages(mut self, pages: u64) -> Self {
        self.max_pages = pages.max(1);
        self
    }
    pub fn with_retries(mut self, retries: u32, delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = delay_ms;
        self
    }
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
}

/// Export options.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Zone for the txt display time.
    pub zone: DisplayZone,
    pub write_buffer_bytes: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { zone: DisplayZone::Local, write_buffer_bytes: 256 * 1024 }
    }
}

impl ExportOptions {
    pub fn with_zone(mut self, zone: impl Into<DisplayZone>) -> Self {
        self.zone = zone.into();
        self
    }
    pub fn with_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }
}
