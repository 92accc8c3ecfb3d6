/// Status reported when a request never completed (DNS failure, refused
/// connection, timeout). Real HTTP statuses start at 100, so 0 never collides.
pub const UNSUCCESSFUL_REQUEST: u16 = 0;

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe(.status, .message))]
pub struct TransportError {
    /// HTTP status, or [`UNSUCCESSFUL_REQUEST`] when no response arrived
    pub status: u16,
    /// Human readable detail for logs
    pub message: String,
}

impl TransportError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        TransportError {
            status,
            message: message.into(),
        }
    }

    /// Builds the sentinel error for a request that never completed.
    pub fn unsuccessful(message: impl Into<String>) -> Self {
        Self::new(UNSUCCESSFUL_REQUEST, message)
    }

    pub fn is_unsuccessful_request(&self) -> bool {
        self.status == UNSUCCESSFUL_REQUEST
    }
}

fn describe(status: &u16, message: &str) -> String {
    if *status == UNSUCCESSFUL_REQUEST {
        format!("request did not complete: {message}")
    } else {
        format!("status {status}: {message}")
    }
}

/// Errors surfaced by the update check.
///
/// The type is `Clone` because the memoized fetch hands the same settled
/// result to every caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The latest version could not be fetched.
    #[error("failed to fetch latest version: {0}")]
    Fetch(#[from] TransportError),
    /// A version string was not a semantic version.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },
    /// The application manifest did not provide a `version` entry.
    #[error("application manifest has no version")]
    MissingManifestVersion,
    /// The host could not display the update prompt.
    #[error("update prompt unavailable: {0}")]
    PromptUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
