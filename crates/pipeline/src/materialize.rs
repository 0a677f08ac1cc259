use crate::error::{Error, ErrorKind, Result};
use crate::list_sorted;
use exn::ResultExt;
use sluice_archive::ArchiveKind;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Suffixes copied into intermediate storage byte-for-byte.
pub const DIRECT_COPY_SUFFIXES: &[&str] = &[".csv", ".json", ".txt", ".parquet"];

/// Why a raw entry produced nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Directory,
    /// Symlinks, sockets, FIFOs and friends.
    NotRegularFile,
    UnsupportedSuffix,
}

/// What happened to one raw entry.
#[derive(Debug)]
pub enum Outcome {
    Copied,
    Extracted { kind: ArchiveKind, entries: usize },
    Skipped(SkipReason),
    Failed(Error),
}

#[derive(Debug)]
pub struct Materialized {
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Per-entry results of one [`materialize`] pass, in processing order.
#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub items: Vec<Materialized>,
}

impl MaterializeReport {
    pub fn failures(&self) -> impl Iterator<Item = &Materialized> {
        self.items.iter().filter(|item| matches!(item.outcome, Outcome::Failed(_)))
    }

    /// Number of entries that produced intermediate items.
    pub fn produced(&self) -> usize {
        self.items.iter().filter(|item| matches!(item.outcome, Outcome::Copied | Outcome::Extracted { .. })).count()
    }
}

/// Copy or expand every regular file directly inside `raw_dir` into
/// `intermediate_dir`, creating the latter (and its parents) first.
///
/// Entries are processed in file-name order, so when two raw items produce
/// the same intermediate name, the one sorting last wins. A failure on one
/// entry is recorded in the report and does not stop the rest.
///
/// # Errors
/// Only when `intermediate_dir` can't be created or `raw_dir` can't be
/// listed.
#[instrument(skip_all, fields(raw = %raw_dir.display(), intermediate = %intermediate_dir.display()))]
pub fn materialize(raw_dir: &Path, intermediate_dir: &Path) -> Result<MaterializeReport> {
    fs::create_dir_all(intermediate_dir).or_raise(|| ErrorKind::CreateDir(intermediate_dir.to_path_buf()))?;
    let mut report = MaterializeReport::default();
    for entry in list_sorted(raw_dir)? {
        let path = entry.path();
        let name = entry.file_name();
        let outcome = match entry.file_type().or_raise(|| ErrorKind::ListDir(raw_dir.to_path_buf())) {
            Ok(kind) if kind.is_dir() => Outcome::Skipped(SkipReason::Directory),
            Ok(kind) if !kind.is_file() => Outcome::Skipped(SkipReason::NotRegularFile),
            Ok(_) => dispatch(&path, &intermediate_dir.join(&name), intermediate_dir),
            Err(e) => Outcome::Failed(e),
        };
        log_outcome(&path, &outcome);
        report.items.push(Materialized { path, outcome });
    }
    Ok(report)
}

fn dispatch(src: &Path, copy_target: &Path, intermediate_dir: &Path) -> Outcome {
    let name = src.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
    if DIRECT_COPY_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        return match copy_with_metadata(src, copy_target) {
            Ok(()) => Outcome::Copied,
            Err(e) => Outcome::Failed(e),
        };
    }
    match ArchiveKind::from_path(src) {
        Some(kind) => match kind.extract(src, intermediate_dir) {
            Ok(entries) => Outcome::Extracted { kind, entries },
            Err(e) => Outcome::Failed(e.raise(ErrorKind::Extract(src.to_path_buf()))),
        },
        None => Outcome::Skipped(SkipReason::UnsupportedSuffix),
    }
}

/// Copy `src` over `dst`. Permissions come along with [`fs::copy`]; the
/// modification time is carried over afterwards where the platform allows.
fn copy_with_metadata(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst).or_raise(|| ErrorKind::Copy(src.to_path_buf()))?;
    let modified = fs::metadata(src).and_then(|meta| meta.modified());
    let applied = modified.and_then(|time| File::options().write(true).open(dst)?.set_modified(time));
    if let Err(e) = applied {
        tracing::debug!(path = %dst.display(), error = %e, "Could not preserve modification time");
    }
    Ok(())
}

fn log_outcome(path: &Path, outcome: &Outcome) {
    let file = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    match outcome {
        Outcome::Copied => tracing::info!(%file, "Copied"),
        Outcome::Extracted { kind, entries } => tracing::info!(%file, %kind, entries, "Extracted archive"),
        Outcome::Skipped(SkipReason::UnsupportedSuffix) => tracing::info!(%file, "Skipped (unsupported)"),
        Outcome::Skipped(reason) => tracing::debug!(%file, ?reason, "Skipped"),
        Outcome::Failed(e) => tracing::error!(%file, error = ?e, "Failed to materialize"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    struct Dirs {
        _tmp: tempfile::TempDir,
        raw: PathBuf,
        intermediate: PathBuf,
    }

    fn dirs() -> Dirs {
        let tmp = tempfile::tempdir().unwrap();
        let raw = tmp.path().join("data/raw");
        let intermediate = tmp.path().join("data/intermediate");
        fs::create_dir_all(&raw).unwrap();
        Dirs { _tmp: tmp, raw, intermediate }
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    fn outcome_for<'a>(report: &'a MaterializeReport, name: &str) -> &'a Outcome {
        &report.items.iter().find(|item| item.path.file_name().unwrap() == name).unwrap().outcome
    }

    #[test]
    fn test_direct_copies_are_byte_identical() {
        let d = dirs();
        let files: [(&str, &[u8]); 5] = [
            ("table.csv", b"a,b\n1,2\n"),
            ("doc.json", b"{\"x\":5}"),
            ("notes.txt", b"foo bar\n"),
            ("cols.parquet", b"PAR1\x00\x01\x02PAR1"),
            ("SHOUTY.CSV", b"k\nv\n"),
        ];
        for (name, content) in files {
            fs::write(d.raw.join(name), content).unwrap();
        }

        let report = materialize(&d.raw, &d.intermediate).unwrap();
        assert_eq!(report.produced(), 5);
        for (name, content) in files {
            assert_eq!(fs::read(d.intermediate.join(name)).unwrap(), content, "{name}");
        }
        // Raw storage is left alone.
        assert_eq!(fs::read_dir(&d.raw).unwrap().count(), 5);
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let d = dirs();
        let src = d.raw.join("old.csv");
        fs::write(&src, "a\n").unwrap();
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        File::options().write(true).open(&src).unwrap().set_modified(past).unwrap();

        materialize(&d.raw, &d.intermediate).unwrap();
        let copied = fs::metadata(d.intermediate.join("old.csv")).unwrap().modified().unwrap();
        assert_eq!(copied, past);
    }

    #[test]
    fn test_copy_overwrites_existing() {
        let d = dirs();
        fs::create_dir_all(&d.intermediate).unwrap();
        fs::write(d.intermediate.join("table.csv"), "stale").unwrap();
        fs::write(d.raw.join("table.csv"), "fresh").unwrap();

        materialize(&d.raw, &d.intermediate).unwrap();
        assert_eq!(fs::read_to_string(d.intermediate.join("table.csv")).unwrap(), "fresh");
    }

    #[test]
    fn test_zip_entries_are_expanded() {
        let d = dirs();
        write_zip(&d.raw.join("bundle.ZIP"), &[("inner.json", b"[]"), ("deep/er/rows.txt", b"1 2\n")]);

        let report = materialize(&d.raw, &d.intermediate).unwrap();
        assert!(matches!(
            outcome_for(&report, "bundle.ZIP"),
            Outcome::Extracted { kind: ArchiveKind::Zip, entries: 2 }
        ));
        assert_eq!(fs::read(d.intermediate.join("inner.json")).unwrap(), b"[]");
        assert_eq!(fs::read(d.intermediate.join("deep/er/rows.txt")).unwrap(), b"1 2\n");
    }

    #[test]
    fn test_tgz_is_expanded() {
        let d = dirs();
        let mut builder = tar::Builder::new(GzEncoder::new(
            File::create(d.raw.join("bundle.tgz")).unwrap(),
            flate2::Compression::fast(),
        ));
        let content = b"x y\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, "from_tar.txt", &content[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let report = materialize(&d.raw, &d.intermediate).unwrap();
        assert!(matches!(
            outcome_for(&report, "bundle.tgz"),
            Outcome::Extracted { kind: ArchiveKind::Tar, entries: 1 }
        ));
        assert_eq!(fs::read(d.intermediate.join("from_tar.txt")).unwrap(), content);
    }

    #[test]
    fn test_corrupt_zip_does_not_stop_other_items() {
        let d = dirs();
        fs::write(d.raw.join("a_broken.zip"), b"this is not a zip archive").unwrap();
        fs::write(d.raw.join("z_table.csv"), b"a\n1\n").unwrap();

        let report = materialize(&d.raw, &d.intermediate).unwrap();
        match outcome_for(&report, "a_broken.zip") {
            Outcome::Failed(e) => assert!(matches!(&**e, ErrorKind::Extract(_))),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(report.failures().count(), 1);
        assert!(d.intermediate.join("z_table.csv").exists());
    }

    #[test]
    fn test_unsupported_and_directories_are_skipped() {
        let d = dirs();
        fs::write(d.raw.join("readme.md"), "# hi").unwrap();
        fs::write(d.raw.join("data.gz"), "??").unwrap();
        fs::create_dir(d.raw.join("nested.csv")).unwrap();

        let report = materialize(&d.raw, &d.intermediate).unwrap();
        assert!(matches!(outcome_for(&report, "readme.md"), Outcome::Skipped(SkipReason::UnsupportedSuffix)));
        assert!(matches!(outcome_for(&report, "data.gz"), Outcome::Skipped(SkipReason::UnsupportedSuffix)));
        assert!(matches!(outcome_for(&report, "nested.csv"), Outcome::Skipped(SkipReason::Directory)));
        assert_eq!(report.failures().count(), 0);
        assert_eq!(fs::read_dir(&d.intermediate).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let d = dirs();
        let target = d.raw.parent().unwrap().join("elsewhere.csv");
        fs::write(&target, "a\n").unwrap();
        std::os::unix::fs::symlink(&target, d.raw.join("linked.csv")).unwrap();

        let report = materialize(&d.raw, &d.intermediate).unwrap();
        assert!(matches!(outcome_for(&report, "linked.csv"), Outcome::Skipped(SkipReason::NotRegularFile)));
        assert!(!d.intermediate.join("linked.csv").exists());
    }

    #[test]
    fn test_last_sorted_item_wins_on_collision() {
        let d = dirs();
        write_zip(&d.raw.join("a.zip"), &[("shared.txt", b"from a")]);
        write_zip(&d.raw.join("b.zip"), &[("shared.txt", b"from b")]);

        materialize(&d.raw, &d.intermediate).unwrap();
        assert_eq!(fs::read(d.intermediate.join("shared.txt")).unwrap(), b"from b");
    }

    #[test]
    fn test_missing_raw_dir_is_fatal() {
        let d = dirs();
        fs::remove_dir(&d.raw).unwrap();
        let err = materialize(&d.raw, &d.intermediate).unwrap_err();
        assert!(matches!(&*err, ErrorKind::ListDir(_)));
    }
}
