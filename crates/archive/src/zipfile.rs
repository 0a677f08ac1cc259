use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::instrument;
use zip::ZipArchive;

/// Expand every entry of the ZIP archive at `src` into `dst`, preserving the
/// directory structure recorded in the archive.
///
/// Entries whose names would land outside `dst` (absolute paths, `..`) are
/// skipped with a warning. Any other failure aborts the expansion; entries
/// already written stay on disk.
///
/// Returns the number of files written (directories aren't counted).
#[instrument(skip_all, fields(archive = %src.display(), entries))]
pub fn extract_zip(src: &Path, dst: &Path) -> Result<usize> {
    let file = File::open(src).or_raise(|| ErrorKind::Open(src.to_path_buf()))?;
    let mut archive = ZipArchive::new(file).or_raise(|| ErrorKind::InvalidArchive(src.to_path_buf()))?;

    let mut count = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).or_raise(|| ErrorKind::InvalidArchive(src.to_path_buf()))?;
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            tracing::warn!(entry = entry.name(), "Skipping ZIP entry that escapes the destination directory");
            continue;
        };
        let target = dst.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).or_raise(|| ErrorKind::Write(target.clone()))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).or_raise(|| ErrorKind::Write(parent.to_path_buf()))?;
        }
        // Both handles drop at the end of this iteration, error or not.
        let mut output = File::create(&target).or_raise(|| ErrorKind::Write(target.clone()))?;
        io::copy(&mut entry, &mut output).or_raise(|| ErrorKind::InvalidArchive(src.to_path_buf()))?;
        tracing::trace!(entry = %relative.display(), "Extracted ZIP entry");
        count += 1;
    }
    tracing::Span::current().record("entries", count);
    Ok(count)
}
