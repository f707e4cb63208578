//! Handle → account id lookup.

use crate::error::TimelineError;
use crate::record::AccountId;
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::OnceLock;

/// Turns a public handle into the numeric account id the timeline endpoint wants.
/// The page-scraping implementation is fragile against layout changes, so the
/// accumulator only ever sees this trait.
pub trait IdentifierResolver {
    fn resolve(&self, handle: &str) -> Result<AccountId, TimelineError>;
}

fn user_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""user_id":\s*(\d+)"#).expect("static regex"))
}

/// Find the first `"user_id": <digits>` in a profile page body.
pub fn extract_user_id(body: &str) -> Option<AccountId> {
    user_id_pattern()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| AccountId::new(m.as_str()))
}

/// Fetches `<base_url>/<handle>` and scrapes the embedded user id.
pub struct ProfilePageResolver {
    client: Client,
    base_url: String,
}

impl ProfilePageResolver {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    fn profile_url(&self, handle: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), handle)
    }
}

impl IdentifierResolver for ProfilePageResolver {
    fn resolve(&self, handle: &str) -> Result<AccountId, TimelineError> {
        let handle = handle.trim().trim_start_matches('@');
        if handle.is_empty() || handle.contains('/') {
            return Err(TimelineError::Resolution { handle: handle.to_string() });
        }

        let url = self.profile_url(handle);
        tracing::debug!(%url, "fetching profile page");
        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if !status.is_success() {
            // A missing profile is a 404: that is a resolution failure, not a transport one.
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(TimelineError::Resolution { handle: handle.to_string() });
            }
            return Err(TimelineError::Status { url, status: status.as_u16() });
        }
        let body = resp.text()?;

        let id = extract_user_id(&body)
            .ok_or_else(|| TimelineError::Resolution { handle: handle.to_string() })?;
        tracing::info!(handle, account = %id, "resolved account id");
        Ok(id)
    }
}
