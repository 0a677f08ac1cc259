//! Compression detection and streaming decompression.
//!
//! Archives arriving in raw storage are named by whoever published them, so
//! the suffix is only a hint. This crate inspects the leading bytes of a
//! stream instead:
//!
//! - **Format detection** from magic bytes ([`Compression::from_magic_bytes`])
//!   with file extensions as a hint only ([`Compression::from_path`])
//! - **Streaming** decompression via wrapped readers ([`Compression::wrap_reader`])
//! - **Sniff-then-stream** via [`PeekableReader`] and [`Compression::sniff`],
//!   which read just enough of the raw stream to detect the format and then
//!   replay it through the right decoder
//!
//! Bzip2 and Gzip are always available. XZ and Zstd are behind feature flags.

mod construct;
pub mod error;
mod ops;
mod peekable;

pub use crate::peekable::PeekableReader;

/// A supported compression format.
///
/// Variants gated behind feature flags (`xz`, `zstd`) are only available when
/// the corresponding feature is enabled. Defaults to [`None`](Self::None)
/// (uncompressed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz, .tgz)
    Gzip,
    /// XZ/LZMA compression (.xz)
    #[cfg(feature = "xz")]
    Xz,
    /// Zstd compression (.zst)
    #[cfg(feature = "zstd")]
    Zstd,
}
