//! Pagination loop: fetch pages backwards in time, upsert every post into the
//! timeline, and move the cursor to the oldest post of each page.

use crate::config::DownloadOptions;
use crate::error::TimelineError;
use crate::fetcher::{PageFetcher, PageResult};
use crate::progress::ProgressScope;
use crate::record::{AccountId, PostRecord, RawPlurk, Timeline};
use crate::timecode::{format_offset, parse_service_time, truncate_to_second};
use std::fmt;
use time::OffsetDateTime;

/// Why the pagination loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Empty page: history exhausted.
    End,
    /// Private timeline.
    Denied,
    /// A page did not move the cursor strictly backwards.
    Stalled,
    /// `max_pages` reached.
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::End => "end of timeline",
            StopReason::Denied => "timeline is private",
            StopReason::Stalled => "cursor stopped advancing",
            StopReason::PageLimit => "page limit reached",
        };
        f.write_str(s)
    }
}

/// Outcome of a download: whatever was collected, plus why it stopped.
#[derive(Clone, Debug)]
pub struct Download {
    pub timeline: Timeline,
    pub stop: StopReason,
    pub pages: u64,
}

impl Download {
    /// Turn a denied timeline into `TimelineError::PermissionDenied`.
    pub fn require_readable(self, account: &AccountId) -> Result<Self, TimelineError> {
        if self.stop == StopReason::Denied {
            return Err(TimelineError::PermissionDenied { account: account.to_string() });
        }
        Ok(self)
    }
}

/// Result of folding one page into the accumulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageProgress {
    pub new_posts: usize,
    /// The cursor moved strictly older.
    pub advanced: bool,
}

/// Owns the timeline and the cursor for one download.
pub struct Accumulator {
    timeline: Timeline,
    cursor: OffsetDateTime,
    permalink_base: String,
}

impl Accumulator {
    pub fn starting_at(cursor: OffsetDateTime, permalink_base: impl Into<String>) -> Self {
        Self {
            timeline: Timeline::new(),
            cursor: truncate_to_second(cursor),
            permalink_base: permalink_base.into(),
        }
    }

    pub fn starting_now(permalink_base: impl Into<String>) -> Self {
        Self::starting_at(OffsetDateTime::now_utc(), permalink_base)
    }

    /// Current cursor in offset form.
    pub fn cursor(&self) -> String {
        format_offset(self.cursor)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    /// Upsert every record, then take the cursor from the **last** one (pages are
    /// newest first). The cursor never moves forward in time.
    pub fn absorb_page(&mut self, records: Vec<RawPlurk>) -> Result<PageProgress, TimelineError> {
        // Validate every timestamp before touching the timeline; the last one is the cursor.
        let mut oldest = None;
        for raw in &records {
            oldest = Some(parse_service_time(&raw.posted)?);
        }
        let Some(oldest) = oldest else {
            return Ok(PageProgress { new_posts: 0, advanced: false });
        };

        let mut new_posts = 0;
        for raw in records {
            if self.timeline.upsert(PostRecord::from_raw(raw, &self.permalink_base)) {
                new_posts += 1;
            }
        }

        let advanced = oldest < self.cursor;
        if advanced {
            self.cursor = oldest;
        }
        Ok(PageProgress { new_posts, advanced })
    }
}

/// Download the whole visible timeline of `account`, newest first.
pub fn download<F: PageFetcher>(
    fetcher: &mut F,
    account: &AccountId,
    opts: &DownloadOptions,
) -> Result<Download, TimelineError> {
    let acc = Accumulator::starting_now(opts.base_url.as_str());
    download_from(fetcher, account, opts, acc)
}

/// Same as `download`, continuing from an explicit accumulator state.
pub fn download_from<F: PageFetcher>(
    fetcher: &mut F,
    account: &AccountId,
    opts: &DownloadOptions,
    mut acc: Accumulator,
) -> Result<Download, TimelineError> {
    let pb = if opts.progress {
        ProgressScope::pages(opts.progress_label.clone().unwrap_or_else(|| format!("account {account}")))
    } else {
        ProgressScope::hidden()
    };

    let mut pages = 0u64;
    let stop = loop {
        if pages >= opts.max_pages {
            tracing::warn!(pages, "page limit reached; keeping what was collected");
            break StopReason::PageLimit;
        }

        let offset = acc.cursor();
        tracing::debug!(%offset, "get plurks");
        match fetcher.fetch(account, &offset)? {
            PageResult::Denied => {
                tracing::warn!(%account, "this is a private timeline");
                break StopReason::Denied;
            }
            PageResult::End => {
                tracing::info!(posts = acc.timeline().len(), "get plurks: end");
                break StopReason::End;
            }
            PageResult::Page(records) => {
                pages += 1;
                let n = records.len();
                let step = acc.absorb_page(records)?;
                tracing::debug!(page = pages, records = n, new = step.new_posts, "page absorbed");
                pb.page_done(acc.timeline().len(), &acc.cursor());
                if !step.advanced {
                    tracing::warn!(offset = %acc.cursor(), "cursor did not advance; stopping to avoid a loop");
                    break StopReason::Stalled;
                }
            }
        }
    };

    pb.finish(format!("{} posts ({stop})", acc.timeline().len()));
    Ok(Download { timeline: acc.into_timeline(), stop, pages })
}
