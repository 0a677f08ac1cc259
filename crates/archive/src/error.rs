//! Archive Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The archive file could not be opened at all.
    #[display("cannot open archive: {}", _0.display())]
    Open(#[error(not(source))] PathBuf),
    /// The container is corrupt, truncated or not the format it claims to be.
    /// Don't retry with the same input.
    #[display("invalid or corrupted archive: {}", _0.display())]
    InvalidArchive(#[error(not(source))] PathBuf),
    /// The compression layer around a tar stream could not be decoded.
    #[display("compression error")]
    Compression,
    /// Writing an entry into the destination failed.
    #[display("failed to write entry: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Open(_) | Self::Write(_))
    }
}
