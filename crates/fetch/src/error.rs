//! Fetch Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No source URL was configured. Set one and try again.
    #[display("missing source URL (set SLUICE_SOURCE_URL or GITHUB_DATA_URL)")]
    MissingSourceUrl,
    /// The configured source URL doesn't parse.
    #[display("invalid source URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// The HTTP client could not be constructed.
    #[display("failed to initialise HTTP client")]
    Client,
    /// Connecting to or reading from the remote failed.
    #[display("request failed: {_0}")]
    Request(#[error(not(source))] String),
    /// The remote answered with a non-success status.
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// The raw storage directory or destination file couldn't be written.
    #[display("failed to write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Write(_) => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}
