//! bedGraph signal parsing, which wraps the [`csv`] crate's deserialization
//! method using [`serde`].

use csv::{Reader, ReaderBuilder, StringRecord, StringRecordsIntoIter};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;

use crate::error::GWindowsError;
use crate::io::file::InputFile;
use crate::ranges::validate_range;
use crate::Position;

/// One bedGraph row: a range and its signal value.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BedGraphRecord {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub value: f32,
}

/// Build a TSV reader which ignores comment lines and works on gzip-compressed files.
///
/// UCSC `track` and `browser` header lines are not comments, so they are filtered
/// out in [`BedGraphIterator`].
pub fn build_tsv_reader(
    filepath: impl Into<PathBuf>,
) -> Result<Reader<Box<dyn Read>>, GWindowsError> {
    let stream = InputFile::new(filepath).reader()?;
    let stream: Box<dyn Read> = Box::new(stream);

    let reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(stream);
    Ok(reader)
}

/// A lazy parser over a bedGraph file.
pub struct BedGraphIterator {
    inner: StringRecordsIntoIter<Box<dyn Read>>,
}

impl std::fmt::Debug for BedGraphIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedGraphIterator").finish_non_exhaustive()
    }
}

impl BedGraphIterator {
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, GWindowsError> {
        let reader = build_tsv_reader(filepath)?;
        Ok(Self {
            inner: reader.into_records(),
        })
    }
}

impl Iterator for BedGraphIterator {
    type Item = Result<BedGraphRecord, GWindowsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.inner.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(csv_error(e, ""))),
            };
            let first = row.get(0).unwrap_or("");
            if first.starts_with("track") || first.starts_with("browser") {
                continue;
            }
            return Some(parse_bedgraph_row(&row));
        }
    }
}

fn csv_error(error: csv::Error, line: &str) -> GWindowsError {
    match error.into_kind() {
        csv::ErrorKind::Io(e) => GWindowsError::IOError(e),
        csv::ErrorKind::Deserialize { err, .. } => GWindowsError::InvalidColumnType {
            expected_type: "bedGraph row (seqname, start, end, value)".to_string(),
            found_value: err.to_string(),
            line: line.to_string(),
        },
        other => GWindowsError::InvalidColumnType {
            expected_type: "bedGraph row (seqname, start, end, value)".to_string(),
            found_value: format!("{:?}", other),
            line: line.to_string(),
        },
    }
}

fn parse_bedgraph_row(row: &StringRecord) -> Result<BedGraphRecord, GWindowsError> {
    let line = row.iter().collect::<Vec<_>>().join("\t");
    if row.len() < 4 {
        return Err(GWindowsError::BedlikeTooFewColumns(line));
    }
    let record: BedGraphRecord = row
        .deserialize(None)
        .map_err(|e| csv_error(e, &line))?;
    validate_range(record.start, record.end)?;
    Ok(record)
}
