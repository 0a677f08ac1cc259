//! Peekable readers for sniff-then-stream workflows.
//!
//! Thin convenience wrapper around standard library I/O primitives
//! ([`Read::take`], [`Cursor`], [`Chain`]) so that the leading bytes of a
//! stream can be inspected without being lost to whatever reads it next.

use crate::Compression;
use crate::construct::MAGIC_LEN;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{Chain, Cursor, Read};

/// A resumable [`Read`]er.
///
/// Read enough data to inspect (e.g., compression magic bytes), then stream
/// the full content onward via [`into_reader`](Self::into_reader).
pub struct PeekableReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: Read> PeekableReader<R> {
    /// Wrap any reader for peeking.
    pub fn new(inner: R) -> Self {
        Self { inner, buffer: Vec::new() }
    }

    /// Read up to `limit` bytes from the start of the stream.
    ///
    /// Returns a slice of buffered data. Successive calls do not accumulate:
    /// - `peek(4)` puts 4 bytes in the buffer, returns 4 bytes
    /// - `peek(8)` reads an additional 4 bytes, returns 8 bytes
    /// - `peek(2)` immediately returns 2 bytes (buffer already has 8)
    ///
    /// Short streams return fewer than `limit` bytes rather than erroring.
    pub fn peek(&mut self, limit: usize) -> Result<&[u8]> {
        if self.buffer.len() >= limit {
            return Ok(&self.buffer[..limit]);
        }
        let needed = (limit - self.buffer.len()) as u64;
        (&mut self.inner).take(needed).read_to_end(&mut self.buffer).or_raise(|| ErrorKind::Io)?;
        Ok(&self.buffer[..self.buffer.len().min(limit)])
    }

    /// Convert into a [`Read`]er that replays the buffered head, then
    /// streams the rest of the inner reader.
    pub fn into_reader(self) -> Chain<Cursor<Vec<u8>>, R> {
        Cursor::new(self.buffer).chain(self.inner)
    }
}

impl Compression {
    /// Detect the compression of a raw stream from its header and return a
    /// reader that yields the decompressed content from the very first byte.
    ///
    /// # Example
    ///
    /// ```
    /// use std::io::{Cursor, Read};
    /// use sluice_compress::Compression;
    ///
    /// let (format, mut reader) = Compression::sniff(Cursor::new(b"not compressed")).unwrap();
    /// assert_eq!(format, Compression::None);
    /// let mut out = String::new();
    /// reader.read_to_string(&mut out).unwrap();
    /// assert_eq!(out, "not compressed");
    /// ```
    pub fn sniff<'a, R: Read + 'a>(reader: R) -> Result<(Compression, Box<dyn Read + 'a>)> {
        let mut peekable = PeekableReader::new(reader);
        let format = Compression::from_magic_bytes(peekable.peek(MAGIC_LEN)?);
        tracing::debug!(format = %format, "Detected compression from stream header");
        let reader = format.wrap_reader(peekable.into_reader())?;
        Ok((format, reader))
    }
}
