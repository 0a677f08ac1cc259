//! Best-effort conversion of intermediate files into CSV.
//!
//! [`convert_file`] looks at one file, decides from its suffix whether it can
//! be turned into CSV, and if so writes `<stem>.csv` next to it. The source
//! is never modified. Formats this crate can't read are reported as
//! [`Conversion::Unsupported`], not as errors, so a caller sweeping a whole
//! directory can keep going.

pub mod error;
pub mod json;
pub mod text;

use crate::error::{ErrorKind, Result};
use crate::json::{HeaderPolicy, JsonShape};
use crate::text::TextError;
use exn::ResultExt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// The canonical output suffix.
pub const CSV_EXTENSION: &str = "csv";

/// Input formats, classified by (case-insensitive) file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    /// Already canonical.
    Csv,
    Json,
    Text,
    /// Anything else, including `.parquet`.
    Other,
}

impl SourceFormat {
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let extension = path.as_ref().extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
        match extension.as_deref() {
            Some(CSV_EXTENSION) => SourceFormat::Csv,
            Some("json") => SourceFormat::Json,
            Some("txt") => SourceFormat::Text,
            _ => SourceFormat::Other,
        }
    }
}

/// The outcome of (successfully) attempting to convert one file.
#[derive(Debug, PartialEq, Eq)]
pub enum Conversion {
    /// A CSV sibling was written.
    Converted { output: PathBuf, rows: usize },
    /// The file is already CSV; nothing to do.
    AlreadyCanonical,
    /// The content holds no tabular data (empty array, non-object JSON).
    Empty,
    /// No converter exists for this format.
    Unsupported,
}

/// Path of the CSV sibling for `path`: same directory, same stem.
#[must_use]
pub fn csv_sibling(path: &Path) -> PathBuf {
    path.with_extension(CSV_EXTENSION)
}

/// Convert the file at `path` into a CSV sibling, overwriting any previous
/// sibling of that name.
///
/// # Errors
/// Returns [`ErrorKind::Read`], [`ErrorKind::Parse`] or [`ErrorKind::Write`]
/// carrying the path that failed. A write failure may leave a partial CSV.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn convert_file(path: &Path, policy: HeaderPolicy) -> Result<Conversion> {
    match SourceFormat::from_path(path) {
        SourceFormat::Csv => Ok(Conversion::AlreadyCanonical),
        SourceFormat::Json => convert_json(path, policy),
        SourceFormat::Text => convert_text(path),
        SourceFormat::Other => Ok(Conversion::Unsupported),
    }
}

fn convert_json(path: &Path, policy: HeaderPolicy) -> Result<Conversion> {
    let file = File::open(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let value: serde_json::Value =
        serde_json::from_reader(BufReader::new(file)).or_raise(|| ErrorKind::Parse(path.to_path_buf()))?;
    let records = JsonShape::from(value).into_records();
    if policy.header(&records).is_empty() {
        tracing::debug!("No tabular records in JSON document; nothing to convert");
        return Ok(Conversion::Empty);
    }

    let output = csv_sibling(path);
    let writer = BufWriter::new(File::create(&output).or_raise(|| ErrorKind::Write(output.clone()))?);
    let stats = json::write_records(&records, policy, writer).or_raise(|| ErrorKind::Write(output.clone()))?;
    if stats.divergent > 0 {
        tracing::warn!(
            divergent = stats.divergent,
            rows = stats.rows,
            "Some JSON records have keys that differ from the first record; projected onto its header"
        );
    }
    Ok(Conversion::Converted { output, rows: stats.rows })
}

fn convert_text(path: &Path) -> Result<Conversion> {
    let file = File::open(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let output = csv_sibling(path);
    let writer = BufWriter::new(File::create(&output).or_raise(|| ErrorKind::Write(output.clone()))?);
    match text::write_lines(BufReader::new(file), writer) {
        Ok(rows) => Ok(Conversion::Converted { output, rows }),
        Err(TextError::Read(e)) => Err(e).or_raise(|| ErrorKind::Read(path.to_path_buf())),
        Err(TextError::Write(e)) => Err(e).or_raise(|| ErrorKind::Write(output)),
    }
}
