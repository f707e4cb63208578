//! Error taxonomy shared by the resolver, the page fetcher and the timestamp codec.

use thiserror::Error;

/// Failures that stop a timeline download.
///
/// A private timeline is normally *not* an error: the fetcher reports it as
/// `PageResult::Denied` and the download ends gracefully. `PermissionDenied` is
/// only produced by `Download::require_readable` for callers that want it fatal.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Network, DNS, TLS or timeout failure below the HTTP layer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status and no usable body.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The profile page did not expose a numeric account id.
    #[error("could not resolve account id for handle {handle:?} (private, missing, or page layout changed)")]
    Resolution { handle: String },

    /// A timestamp from the service did not match `Www, DD Mon YYYY HH:MM:SS GMT`.
    #[error("unparseable service timestamp {value:?}")]
    Format { value: String },

    #[error("timeline of account {account} is not readable")]
    PermissionDenied { account: String },
}
