//! The extract-and-normalize half of an ingestion run.
//!
//! A run is two sequential passes over the filesystem:
//!
//! 1. [`materialize`] copies accepted files and expands archives from raw
//!    storage into intermediate storage.
//! 2. [`normalize`] converts everything in intermediate storage that isn't
//!    already CSV into a CSV sibling.
//!
//! Both passes tolerate per-item failure. Each returns a report, and only
//! directory-level problems abort the run.

pub mod error;
mod materialize;
mod normalize;

pub use crate::materialize::{
    DIRECT_COPY_SUFFIXES, MaterializeReport, Materialized, Outcome, SkipReason, materialize,
};
pub use crate::normalize::{NormalizeReport, Normalized, normalize};
pub use sluice_convert::Conversion;
pub use sluice_convert::json::HeaderPolicy;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use tracing::instrument;

pub const DEFAULT_RAW_DIR: &str = "data/raw";
pub const DEFAULT_INTERMEDIATE_DIR: &str = "data/intermediate";

/// Where a run reads from and writes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub raw_dir: PathBuf,
    pub intermediate_dir: PathBuf,
    pub header_policy: HeaderPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
            intermediate_dir: PathBuf::from(DEFAULT_INTERMEDIATE_DIR),
            header_policy: HeaderPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub materialized: MaterializeReport,
    pub normalized: NormalizeReport,
}

impl RunReport {
    pub fn failure_count(&self) -> usize {
        self.materialized.failures().count() + self.normalized.failures().count()
    }
}

/// Materialize, then normalize. Returns once both passes have finished.
#[instrument(skip_all)]
pub fn run(config: &PipelineConfig) -> Result<RunReport> {
    let materialized = materialize(&config.raw_dir, &config.intermediate_dir)?;
    let normalized = normalize(&config.intermediate_dir, config.header_policy)?;
    let report = RunReport { materialized, normalized };
    tracing::info!(
        output = %config.intermediate_dir.display(),
        failures = report.failure_count(),
        "Extraction & conversion complete"
    );
    Ok(report)
}

/// Entries directly inside `dir`, sorted by file name.
pub(crate) fn list_sorted(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut entries = fs::read_dir(dir)
        .and_then(|entries| entries.collect::<std::io::Result<Vec<_>>>())
        .or_raise(|| ErrorKind::ListDir(dir.to_path_buf()))?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_run_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            raw_dir: tmp.path().join("data/raw"),
            intermediate_dir: tmp.path().join("data/intermediate"),
            ..PipelineConfig::default()
        };
        fs::create_dir_all(&config.raw_dir).unwrap();

        let mut zip = ZipWriter::new(fs::File::create(config.raw_dir.join("dataset.zip")).unwrap());
        zip.start_file("records.json", SimpleFileOptions::default()).unwrap();
        zip.write_all(br#"[{"id":1,"name":"alpha"},{"id":2,"name":"beta"}]"#).unwrap();
        zip.start_file("log.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"2024-01-01 start\n2024-01-02   stop\n").unwrap();
        zip.finish().unwrap();
        fs::write(config.raw_dir.join("extra.csv"), "a\n1\n").unwrap();

        let report = run(&config).unwrap();
        assert_eq!(report.failure_count(), 0);
        assert_eq!(report.materialized.produced(), 2);

        let out = &config.intermediate_dir;
        assert_eq!(fs::read_to_string(out.join("records.csv")).unwrap(), "id,name\n1,alpha\n2,beta\n");
        assert_eq!(fs::read_to_string(out.join("log.csv")).unwrap(), "2024-01-01,start\n2024-01-02,stop\n");
        assert_eq!(fs::read_to_string(out.join("extra.csv")).unwrap(), "a\n1\n");
    }

    #[test]
    fn test_default_config_paths() {
        let config = PipelineConfig::default();
        assert_eq!(config.raw_dir, Path::new("data/raw"));
        assert_eq!(config.intermediate_dir, Path::new("data/intermediate"));
        assert_eq!(config.header_policy, HeaderPolicy::FirstRecord);
    }
}
