use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sluice_compress::{Compression, PeekableReader};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tar::Archive;
use tracing::instrument;

/// Expand every entry of the tar archive at `src` into `dst`, preserving the
/// internal directory structure.
///
/// The compression layer (none, gzip, bzip2, and xz/zstd when enabled) is
/// detected from the first bytes of the file, not from its name. Entries that
/// would escape `dst` are skipped by [`tar::Entry::unpack_in`].
///
/// Returns the number of regular files written.
#[instrument(skip_all, fields(archive = %src.display(), compression, entries))]
pub fn extract_tar(src: &Path, dst: &Path) -> Result<usize> {
    let file = File::open(src).or_raise(|| ErrorKind::Open(src.to_path_buf()))?;
    let (compression, reader) =
        Compression::sniff(BufReader::new(file)).map_err(|err| err.raise(ErrorKind::Compression))?;
    tracing::Span::current().record("compression", compression.as_str());
    let hint = Compression::from_path(src);
    if hint != compression {
        tracing::warn!(%hint, detected = %compression, "File name disagrees with content; using detected compression");
    }

    // A zero-length stream (compressed or not) holds no tar header at all.
    let mut reader = PeekableReader::new(reader);
    let empty = reader.peek(1).map_err(|err| err.raise(ErrorKind::InvalidArchive(src.to_path_buf())))?.is_empty();
    if empty {
        exn::bail!(ErrorKind::InvalidArchive(src.to_path_buf()));
    }
    fs::create_dir_all(dst).or_raise(|| ErrorKind::Write(dst.to_path_buf()))?;

    let mut archive = Archive::new(reader.into_reader());
    let mut count = 0;
    for entry in archive.entries().or_raise(|| ErrorKind::InvalidArchive(src.to_path_buf()))? {
        let mut entry = entry.or_raise(|| ErrorKind::InvalidArchive(src.to_path_buf()))?;
        let is_file = entry.header().entry_type().is_file();
        let name = entry.path().map(|p| p.display().to_string()).unwrap_or_default();
        // Also covers truncated or corrupt compressed streams.
        let unpacked = entry.unpack_in(dst).or_raise(|| ErrorKind::InvalidArchive(src.to_path_buf()))?;
        if !unpacked {
            tracing::warn!(entry = %name, "Skipping tar entry that escapes the destination directory");
            continue;
        }
        if is_file {
            tracing::trace!(entry = %name, "Extracted tar entry");
            count += 1;
        }
    }
    tracing::Span::current().record("entries", count);
    Ok(count)
}
