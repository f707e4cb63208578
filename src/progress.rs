//! Progress reporting for the pagination loop: an indicatif spinner counting pages.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} {prefix} {pos} pages  {msg}  elapsed: {elapsed_precise}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// A small wrapper around an optional `indicatif` spinner.
/// `ProgressScope::hidden()` draws nothing, so callers never branch on `progress`.
pub struct ProgressScope {
    pb: ProgressBar,
}

impl ProgressScope {
    pub fn pages<T: Into<String>>(label: T) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        let label = label.into();
        if !label.is_empty() {
            pb.set_prefix(label);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn hidden() -> Self {
        Self { pb: ProgressBar::hidden() }
    }

    /// One more page; `posts` is the running total of distinct posts.
    pub fn page_done(&self, posts: usize, offset: &str) {
        self.pb.inc(1);
        self.pb.set_message(format!("{posts} posts, offset {offset}"));
    }

    pub fn finish<T: Into<String>>(&self, msg: T) {
        self.pb.finish_with_message(msg.into());
    }
}
