//! Shared blocking HTTP client for the profile lookup and the timeline endpoint.

use crate::config::DownloadOptions;
use crate::error::TimelineError;
use reqwest::blocking::Client;

/// Build the one client used for a run: finite timeout, fixed user agent, gzip.
pub fn build_client(opts: &DownloadOptions) -> Result<Client, TimelineError> {
    let client = Client::builder()
        .timeout(opts.request_timeout)
        .connect_timeout(opts.request_timeout)
        .user_agent(opts.user_agent.clone())
        .gzip(true)
        .build()?;
    Ok(client)
}
