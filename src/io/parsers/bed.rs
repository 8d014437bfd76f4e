//! BED annotation parsing.
//!
//! Annotation BED files are BED4+: the fourth (name) column is the feature label,
//! and a sixth column, when present, is the strand. Comment lines and UCSC `track`
//! and `browser` lines are skipped.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use super::parse_column;
use crate::error::GWindowsError;
use crate::io::file::InputFile;
use crate::ranges::{Feature, FeatureRecord, Strand};
use crate::Position;

pub const PARSE_CAPACITY: usize = 512;

/// A lazy parser over BED annotation files, yielding [`FeatureRecord`]s.
pub struct BedAnnotationIterator {
    reader: BufReader<Box<dyn Read>>,
    line_buffer: String,
}

impl std::fmt::Debug for BedAnnotationIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedAnnotationIterator").finish_non_exhaustive()
    }
}

impl BedAnnotationIterator {
    /// Create a new parsing iterator over a (possibly gzipped) BED file.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, GWindowsError> {
        let reader = InputFile::new(filepath).reader()?;
        let line_buffer = String::with_capacity(PARSE_CAPACITY);
        Ok(Self {
            reader,
            line_buffer,
        })
    }
}

impl Iterator for BedAnnotationIterator {
    type Item = Result<FeatureRecord, GWindowsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_buffer.clear();
            match self.reader.read_line(&mut self.line_buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    let line = self.line_buffer.trim_end();
                    if line.is_empty() || is_bed_metadata(line) {
                        continue;
                    }
                    return Some(parse_bed_annotation(line));
                }
                Err(e) => return Some(Err(GWindowsError::IOError(e))),
            }
        }
    }
}

fn is_bed_metadata(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
}

/// Parse a BED4+ line into a [`FeatureRecord`].
pub fn parse_bed_annotation(line: &str) -> Result<FeatureRecord, GWindowsError> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < 4 {
        return Err(GWindowsError::BedlikeTooFewColumns(line.to_string()));
    }

    let seqname = columns[0].to_string();
    let start: Position = parse_column(columns[1], line)?;
    let end: Position = parse_column(columns[2], line)?;
    let name = columns[3];
    let strand = match columns.get(5) {
        Some(strand) => Strand::parse_column(strand.trim())?,
        None => None,
    };

    let record = FeatureRecord::new(seqname, start, end, Feature::new(name, strand));
    record.validate()?;
    Ok(record)
}
