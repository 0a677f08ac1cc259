//! JSON documents to CSV.
//!
//! A document is classified once, at parse time, into a [`JsonShape`]. Only
//! objects and arrays of objects carry tabular data; anything else converts
//! to nothing.

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::io::Write;

pub type Record = Map<String, Value>;

/// The tabular interpretation of a parsed JSON document.
#[derive(Debug, PartialEq)]
pub enum JsonShape {
    /// A single top-level object; treated as a one-row table.
    Record(Record),
    /// A top-level array whose elements are all objects. May be empty.
    Records(Vec<Record>),
    /// Scalars, or arrays containing anything other than objects.
    Other,
}

impl From<Value> for JsonShape {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(record) => JsonShape::Record(record),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map_or(JsonShape::Other, JsonShape::Records),
            _ => JsonShape::Other,
        }
    }
}

impl JsonShape {
    /// Flatten into the rows to write. [`Other`](Self::Other) has none.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            JsonShape::Record(record) => vec![record],
            JsonShape::Records(records) => records,
            JsonShape::Other => Vec::new(),
        }
    }
}

/// How the CSV header is chosen when records don't all share the same keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// The first record's keys, in document order, are the header. Later
    /// records are projected onto it: missing keys become empty cells and
    /// keys outside the header are dropped.
    #[default]
    FirstRecord,
}

impl HeaderPolicy {
    pub fn header<'a>(&self, records: &'a [Record]) -> Vec<&'a str> {
        match self {
            HeaderPolicy::FirstRecord => {
                records.first().map(|first| first.keys().map(String::as_str).collect()).unwrap_or_default()
            },
        }
    }
}

/// Counts from writing one table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    pub rows: usize,
    /// Records whose key set differs from the header.
    pub divergent: usize,
}

/// Write `records` as CSV (header row first) into `writer`.
///
/// Writes nothing at all, not even a header, when the header is empty (no
/// records, or a first record with no keys).
pub fn write_records<W: Write>(records: &[Record], policy: HeaderPolicy, writer: W) -> csv::Result<TableStats> {
    let mut stats = TableStats::default();
    let header = policy.header(records);
    if header.is_empty() {
        return Ok(stats);
    }
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&header)?;
    for (index, record) in records.iter().enumerate() {
        if record.len() != header.len() || header.iter().any(|key| !record.contains_key(*key)) {
            tracing::debug!(record = index, "Record keys differ from header; projecting onto header");
            stats.divergent += 1;
        }
        csv.write_record(header.iter().map(|key| record.get(*key).map(cell).unwrap_or_default().into_owned()))?;
        stats.rows += 1;
    }
    csv.flush()?;
    Ok(stats)
}

/// Render one JSON value as a CSV cell.
fn cell(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        // The literal as written in the source; never reformatted through f64.
        Value::Number(n) => Cow::Owned(n.to_string()),
        // Nested structures keep their JSON text so nothing is lost.
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}
