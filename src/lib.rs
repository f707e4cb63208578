mod config;
mod error;
mod timecode;
mod base36;
mod record;

mod client;
mod resolver;
mod fetcher;
mod accumulator;

mod progress;
mod lines;
mod export;
mod util;
mod pipeline;

pub use crate::config::{DownloadOptions, ExportFormat, ExportOptions, DEFAULT_BASE_URL};
pub use crate::error::TimelineError;
pub use crate::pipeline::{RunSummary, TimelineDownloader};

// Data model.
pub use crate::record::{AccountId, PostRecord, RawPlurk, Timeline};

// Timestamp codec and permalinks.
pub use crate::timecode::{format_local, format_offset, parse_service_time, service_time_to_local, DisplayZone};
pub use crate::base36::{from_base36, permalink, to_base36};

// Collaborator seams: swap the resolver or script the fetcher without touching the loop.
pub use crate::resolver::{extract_user_id, IdentifierResolver, ProfilePageResolver};
pub use crate::fetcher::{classify_response, HttpPageFetcher, PageFetcher, PageResult, NO_READ_PERMISSION};
pub use crate::client::build_client;

// Pagination loop.
pub use crate::accumulator::{download, download_from, Accumulator, Download, PageProgress, StopReason};

// Exporters.
pub use crate::export::{
    collapse_line_breaks, escape_newlines, export, output_path, reverse_txt_file, txt_line, unescape_newlines,
    write_csv, write_json, write_txt, CSV_HEADER,
};

pub use crate::util::init_tracing_once;
