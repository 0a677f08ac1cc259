use crate::error::{Error, ErrorKind, Result};
use crate::list_sorted;
use sluice_convert::json::HeaderPolicy;
use sluice_convert::{Conversion, convert_file};
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug)]
pub struct Normalized {
    pub path: PathBuf,
    pub result: Result<Conversion>,
}

/// Per-file results of one [`normalize`] pass, in processing order.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub items: Vec<Normalized>,
}

impl NormalizeReport {
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &Error)> {
        self.items.iter().filter_map(|item| item.result.as_ref().err().map(|e| (item.path.as_path(), e)))
    }

    /// Paths of the CSV files written during this pass.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.items.iter().filter_map(|item| match &item.result {
            Ok(Conversion::Converted { output, .. }) => Some(output.as_path()),
            _ => None,
        })
    }
}

/// Convert every regular file directly inside `intermediate_dir` that isn't
/// already CSV into a `.csv` sibling.
///
/// The directory is listed once, up front, so siblings written during the
/// pass are not themselves revisited. Subdirectories left behind by archive
/// expansion are not descended into. Per-file failures are logged and
/// recorded; the pass always runs to the end.
///
/// # Errors
/// Only when `intermediate_dir` can't be listed.
#[instrument(skip_all, fields(intermediate = %intermediate_dir.display()))]
pub fn normalize(intermediate_dir: &Path, policy: HeaderPolicy) -> Result<NormalizeReport> {
    let mut report = NormalizeReport::default();
    for entry in list_sorted(intermediate_dir)? {
        let path = entry.path();
        if !entry.file_type().is_ok_and(|kind| kind.is_file()) {
            tracing::debug!(path = %path.display(), "Not a regular file; not converting");
            continue;
        }
        let result = convert_file(&path, policy).map_err(|err| err.raise(ErrorKind::Convert(path.clone())));
        log_result(&path, &result);
        report.items.push(Normalized { path, result });
    }
    Ok(report)
}

fn log_result(path: &Path, result: &Result<Conversion>) {
    let file = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    match result {
        Ok(Conversion::Converted { output, rows }) => {
            tracing::info!(%file, output = %output.display(), rows, "Converted to CSV")
        },
        Ok(Conversion::AlreadyCanonical) => tracing::trace!(%file, "Already CSV"),
        Ok(Conversion::Empty) => tracing::debug!(%file, "No tabular content; nothing written"),
        Ok(Conversion::Unsupported) => tracing::warn!(%file, "Skipped conversion (unsupported format)"),
        Err(e) => tracing::error!(%file, error = ?e, "Conversion failed"),
    }
}
