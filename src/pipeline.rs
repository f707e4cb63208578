use crate::accumulator::{download, StopReason};
use crate::client::build_client;
use crate::config::{DownloadOptions, ExportFormat, ExportOptions};
use crate::export::{export, output_path, reverse_txt_file};
use crate::fetcher::{HttpPageFetcher, PageFetcher};
use crate::record::AccountId;
use crate::resolver::{IdentifierResolver, ProfilePageResolver};
use crate::timecode::DisplayZone;
use crate::util::init_tracing_once;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolve → download → export → (optionally) reverse, for one handle.
#[derive(Clone, Debug)]
pub struct TimelineDownloader {
    pub(crate) handle: Option<String>,
    pub(crate) output_base: Option<PathBuf>,
    pub(crate) formats: Vec<ExportFormat>,
    pub(crate) reverse: bool,
    pub(crate) download: DownloadOptions,
    pub(crate) export: ExportOptions,
}

/// What a run did.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub account: AccountId,
    pub posts: usize,
    pub pages: u64,
    pub stop: StopReason,
    pub files: Vec<PathBuf>,
    pub reversed: bool,
}

impl Default for TimelineDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineDownloader {
    pub fn new() -> Self {
        Self {
            handle: None,
            output_base: None,
            formats: Vec::new(),
            reverse: false,
            download: DownloadOptions::default(),
            export: ExportOptions::default(),
        }
    }

    // -------- Builder methods --------
    pub fn handle(mut self, handle: impl AsRef<str>) -> Self { self.handle = Some(handle.as_ref().trim().to_string()); self }
    pub fn output_base(mut self, base: impl AsRef<Path>) -> Self { self.output_base = Some(base.as_ref().to_path_buf()); self }
    pub fn format(mut self, format: ExportFormat) -> Self { self.formats.push(format); self }
    pub fn formats<I>(mut self, iter: I) -> Self where I: IntoIterator<Item = ExportFormat> { self.formats.extend(iter); self }
    pub fn reverse(mut self, yes: bool) -> Self { self.reverse = yes; self }
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self { self.download = self.download.with_base_url(url); self }
    pub fn request_timeout(mut self, timeout: Duration) -> Self { self.download = self.download.with_request_timeout(timeout); self }
    pub fn max_pages(mut self, pages: u64) -> Self { self.download = self.download.with_max_pages(pages); self }
    pub fn retries(mut self, retries: u32, delay_ms: u64) -> Self { self.download = self.download.with_retries(retries, delay_ms); self }
    pub fn progress(mut self, yes: bool) -> Self { self.download = self.download.with_progress(yes); self }
    pub fn zone(mut self, zone: impl Into<DisplayZone>) -> Self { self.export = self.export.with_zone(zone); self }
    pub fn write_buffer(mut self, bytes: usize) -> Self { self.export = self.export.with_write_buffer(bytes); self }

    /// Run against the live service.
    pub fn run(self) -> Result<RunSummary> {
        init_tracing_once();
        let client = build_client(&self.download)?;
        let resolver = ProfilePageResolver::new(client.clone(), self.download.base_url.as_str());
        let mut fetcher = HttpPageFetcher::new(client, &self.download.base_url)
            .with_retries(self.download.retries, self.download.retry_delay_ms);
        self.run_with(&resolver, &mut fetcher)
    }

    /// Run with caller-supplied collaborators (scripted fetchers in tests, or an
    /// API-based resolver).
    pub fn run_with<R, F>(self, resolver: &R, fetcher: &mut F) -> Result<RunSummary>
    where
        R: IdentifierResolver + ?Sized,
        F: PageFetcher,
    {
        let handle = self.handle.clone().filter(|h| !h.is_empty()).ok_or_else(|| anyhow!("handle is required"))?;
        if self.formats.is_empty() {
            return Err(anyhow!("at least one output format is required"));
        }
        let base = self.output_base.clone().unwrap_or_else(|| PathBuf::from(&handle));
        if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }

        let account = resolver.resolve(&handle)?;
        let result = download(fetcher, &account, &self.download)
            .with_context(|| format!("downloading timeline of {handle}"))?;
        if result.stop == StopReason::Denied {
            tracing::warn!(handle = %handle, "timeline is private; exporting {} posts", result.timeline.len());
        }

        let files = export(&result.timeline, &base, &self.formats, &self.export)?;

        let txt = output_path(&base, ExportFormat::Txt);
        let reversed = self.reverse
            && self.formats.contains(&ExportFormat::Txt)
            && fs::metadata(&txt).map(|m| m.len() > 0).unwrap_or(false);
        if reversed {
            reverse_txt_file(&txt)?;
        }

        Ok(RunSummary {
            account,
            posts: result.timeline.len(),
            pages: result.pages,
            stop: result.stop,
            files,
            reversed,
        })
    }
}
