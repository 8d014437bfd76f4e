//! Parsing iterators for annotation and signal formats.
//!
//! Each row of a file is yielded as a parsed range record. Annotation parsers yield
//! [`FeatureRecord`]s (a range, a feature name, and an optional strand); the bedGraph
//! parser yields [`BedGraphRecord`]s. All parsers work on both plaintext and
//! gzip-compressed files.
//!
//! Because the annotation format of a file is only known at runtime, the
//! [`AnnotationParser`] enum links a detected [`GenomicFile`] to its parsing iterator.
//!
//! [`BedGraphRecord`]: bedgraph::BedGraphRecord
//! [`GenomicFile`]: detect::GenomicFile

pub mod bed;
pub mod bedgraph;
pub mod detect;
pub mod gff;
pub mod utils;

use std::path::PathBuf;

use crate::error::GWindowsError;
use crate::ranges::FeatureRecord;

use self::bed::BedAnnotationIterator;
use self::detect::GenomicFile;
use self::gff::GffAnnotationIterator;

/// Parse a single column into type `T`, reporting the offending line on failure.
pub fn parse_column<T: std::str::FromStr>(column: &str, line: &str) -> Result<T, GWindowsError>
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    column
        .parse::<T>()
        .map_err(|_| GWindowsError::InvalidColumnType {
            expected_type: std::any::type_name::<T>().to_string(),
            found_value: column.to_string(),
            line: line.to_string(),
        })
}

/// Enum that connects an annotation file type to its specific parser.
#[derive(Debug)]
pub enum AnnotationParser {
    Bed(BedAnnotationIterator),
    Gff(GffAnnotationIterator),
}

impl AnnotationParser {
    /// Detect the annotation format from the file extension and open its parser.
    ///
    /// Signal files and unknown extensions are an error.
    pub fn open(filepath: impl Into<PathBuf>) -> Result<Self, GWindowsError> {
        let filepath = filepath.into();
        match GenomicFile::detect(&filepath)? {
            GenomicFile::Bed(path) => Ok(AnnotationParser::Bed(BedAnnotationIterator::new(path)?)),
            GenomicFile::Gff(path) => Ok(AnnotationParser::Gff(GffAnnotationIterator::new(path)?)),
            GenomicFile::BedGraph(_) => Err(GWindowsError::MixedDatasetSources),
        }
    }
}

impl Iterator for AnnotationParser {
    type Item = Result<FeatureRecord, GWindowsError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            AnnotationParser::Bed(iter) => iter.next(),
            AnnotationParser::Gff(iter) => iter.next(),
        }
    }
}
