//! One timeline page per call: POST to the timeline endpoint and classify the answer.

use crate::error::TimelineError;
use crate::record::{AccountId, RawPlurk};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::thread::sleep;
use std::time::Duration;

/// Error kind the service reports for a timeline the caller may not read.
pub const NO_READ_PERMISSION: &str = "NoReadPermissionError";

/// Classified answer of one page request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageResult {
    /// Non-empty, newest first.
    Page(Vec<RawPlurk>),
    /// Empty post list (or an answer we do not understand).
    End,
    /// Private timeline.
    Denied,
}

/// Issues a single page request for `(account, offset)`.
pub trait PageFetcher {
    fn fetch(&mut self, account: &AccountId, offset: &str) -> Result<PageResult, TimelineError>;
}

/// Map a decoded response body onto `PageResult`.
///
/// Unknown shapes end the download instead of failing it.
pub fn classify_response(body: &Value) -> PageResult {
    if let Some(kind) = body.get("error") {
        let kind = kind.as_str().unwrap_or_default();
        if kind == NO_READ_PERMISSION {
            return PageResult::Denied;
        }
        tracing::warn!(kind, "service returned an error; ending download");
        return PageResult::End;
    }

    let Some(plurks) = body.get("plurks").and_then(Value::as_array) else {
        tracing::warn!("response has no `plurks` array; ending download");
        return PageResult::End;
    };
    if plurks.is_empty() {
        return PageResult::End;
    }

    match plurks
        .iter()
        .map(|p| RawPlurk::deserialize(p))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(records) => PageResult::Page(records),
        Err(e) => {
            tracing::warn!(error = %e, "undecodable post entry; ending download");
            PageResult::End
        }
    }
}

/// Live fetcher for `<base_url>/TimeLine/getPlurks`.
///
/// Always sends `only_user=1`: the account's own posts, no replurks.
pub struct HttpPageFetcher {
    client: Client,
    endpoint: String,
    retries: u32,
    retry_delay_ms: u64,
}

impl HttpPageFetcher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/TimeLine/getPlurks", base_url.trim_end_matches('/')),
            retries: 0,
            retry_delay_ms: 0,
        }
    }

    /// Retry connect/timeout failures up to `retries` extra times.
    pub fn with_retries(mut self, retries: u32, delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = delay_ms;
        self
    }

    fn post_once(&self, account: &AccountId, offset: &str) -> Result<PageResult, TimelineError> {
        let form = [("user_id", account.as_str()), ("offset", offset), ("only_user", "1")];
        let resp = self.client.post(&self.endpoint).form(&form).send()?;
        let status = resp.status();
        let text = resp.text()?;

        // Permission errors come back as JSON with a 4xx status, so decode first.
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Ok(classify_response(&body)),
            Err(_) if !status.is_success() => Err(TimelineError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "timeline response is not JSON; ending download");
                Ok(PageResult::End)
            }
        }
    }
}

fn is_retriable(e: &TimelineError) -> bool {
    match e {
        TimelineError::Transport(err) => err.is_timeout() || err.is_connect(),
        _ => false,
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&mut self, account: &AccountId, offset: &str) -> Result<PageResult, TimelineError> {
        tracing::debug!(%account, offset, "requesting page");
        let mut attempt = 0u32;
        loop {
            match self.post_once(account, offset) {
                Err(e) if attempt < self.retries && is_retriable(&e) => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "page request failed; retrying");
                    sleep(Duration::from_millis(self.retry_delay_ms.saturating_mul(u64::from(attempt))));
                }
                other => return other,
            }
        }
    }
}
