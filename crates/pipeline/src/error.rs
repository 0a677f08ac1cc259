//! Pipeline Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Errors raised for a single item (a copy, an archive, a
//! conversion) are collected into the run's report; only directory-level
//! failures are returned from the top-level operations.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A storage directory could not be created. Aborts the run.
    #[display("cannot create directory: {}", _0.display())]
    CreateDir(#[error(not(source))] PathBuf),
    /// A storage directory could not be listed. Aborts the run.
    #[display("cannot list directory: {}", _0.display())]
    ListDir(#[error(not(source))] PathBuf),
    /// Copying a raw item into intermediate storage failed.
    #[display("failed to copy {}", _0.display())]
    Copy(#[error(not(source))] PathBuf),
    /// Expanding a raw archive failed; see the archive error beneath.
    #[display("failed to extract {}", _0.display())]
    Extract(#[error(not(source))] PathBuf),
    /// Converting an intermediate item to CSV failed.
    #[display("failed to convert {}", _0.display())]
    Convert(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CreateDir(_) | Self::ListDir(_) | Self::Copy(_))
    }
}
