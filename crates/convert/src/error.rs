//! Conversion Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Every variant carries the path of the file involved,
//! since a conversion pass reports failures per file and keeps going.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A conversion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The source file could not be read (missing, unreadable, not UTF-8).
    #[display("failed to read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The source file is not well-formed for its format. Don't retry.
    #[display("failed to parse {}", _0.display())]
    Parse(#[error(not(source))] PathBuf),
    /// The CSV output could not be created or written.
    #[display("failed to write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Write(_))
    }
}
