//! Archive expansion.
//!
//! Two container families are recognised from the file name: ZIP, and tar
//! (optionally compressed). Tar compression is never trusted from the name;
//! it is sniffed from the stream header by [`sluice_compress`], so a `.tgz`
//! that is really bzip2 (or a `.tar.gz` that was never compressed) still
//! expands.
//!
//! Both extractors keep the archive's internal directory layout under the
//! destination, refuse entries that would escape it, and return the number
//! of regular files written.

pub mod error;
mod tarball;
mod zipfile;

pub use crate::tarball::extract_tar;
pub use crate::zipfile::extract_zip;
use crate::error::Result;
use std::path::Path;

const ZIP_SUFFIXES: &[&str] = &[".zip"];
const TAR_SUFFIXES: &[&str] = &[".tar", ".tar.gz", ".tgz"];

/// A container format recognised by file name suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    /// Plain or compressed tar; compression is detected from content.
    Tar,
}

impl ArchiveKind {
    /// Recognise an archive from its file name (case-insensitive).
    ///
    /// Returns `None` for anything that isn't one of `.zip`, `.tar`,
    /// `.tar.gz` or `.tgz`.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_str()?.to_lowercase();
        if ZIP_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            return Some(ArchiveKind::Zip);
        }
        if TAR_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            return Some(ArchiveKind::Tar);
        }
        None
    }

    /// Expand `src` into `dst` using the extractor for this kind.
    pub fn extract(&self, src: &Path, dst: &Path) -> Result<usize> {
        match self {
            ArchiveKind::Zip => extract_zip(src, dst),
            ArchiveKind::Tar => extract_tar(src, dst),
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Tar => "tar",
        })
    }
}
