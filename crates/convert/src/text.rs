//! Whitespace-delimited plain text to CSV.

use std::io::{self, BufRead, Write};

/// Errors from a text conversion: the source can fail independently of the
/// CSV sink, and callers blame different files for each.
#[derive(Debug)]
pub enum TextError {
    Read(io::Error),
    Write(csv::Error),
}

/// Write each line of `reader` as one CSV row of its whitespace-separated
/// tokens. Blank (or all-whitespace) lines become blank rows.
///
/// Returns the number of rows written.
pub fn write_lines<R: BufRead, W: Write>(reader: R, writer: W) -> Result<usize, TextError> {
    // Rows legitimately differ in width.
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    let mut rows = 0;
    for line in reader.lines() {
        let line = line.map_err(TextError::Read)?;
        let mut tokens = line.split_whitespace().peekable();
        if tokens.peek().is_none() {
            // The csv writer quotes an empty record as `""`; a blank row has
            // to bypass it.
            csv.flush().map_err(|e| TextError::Write(e.into()))?;
            csv.get_mut().write_all(b"\n").map_err(|e| TextError::Write(e.into()))?;
        } else {
            csv.write_record(tokens).map_err(TextError::Write)?;
        }
        rows += 1;
    }
    csv.flush().map_err(|e| TextError::Write(e.into()))?;
    Ok(rows)
}
