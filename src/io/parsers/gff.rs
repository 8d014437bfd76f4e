//! GFF/GTF annotation parsing.
//!
//! The feature type (third column) is used as the label. GFF coordinates are 1-based
//! and right-inclusive; records are converted to 0-based right-exclusive ranges.
//! Parsing stops at a `##FASTA` directive.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use super::bed::PARSE_CAPACITY;
use super::parse_column;
use crate::error::GWindowsError;
use crate::io::file::InputFile;
use crate::ranges::{Feature, FeatureRecord, Strand};
use crate::Position;

/// A lazy parser over GFF2/GFF3/GTF files, yielding [`FeatureRecord`]s.
pub struct GffAnnotationIterator {
    reader: BufReader<Box<dyn Read>>,
    line_buffer: String,
    done: bool,
}

impl std::fmt::Debug for GffAnnotationIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GffAnnotationIterator").finish_non_exhaustive()
    }
}

impl GffAnnotationIterator {
    /// Create a new parsing iterator over a (possibly gzipped) GFF or GTF file.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, GWindowsError> {
        let reader = InputFile::new(filepath).reader()?;
        Ok(Self {
            reader,
            line_buffer: String::with_capacity(PARSE_CAPACITY),
            done: false,
        })
    }
}

impl Iterator for GffAnnotationIterator {
    type Item = Result<FeatureRecord, GWindowsError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.line_buffer.clear();
            match self.reader.read_line(&mut self.line_buffer) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    let line = self.line_buffer.trim_end();
                    if line.starts_with("##FASTA") {
                        self.done = true;
                    } else if !line.is_empty() && !line.starts_with('#') {
                        return Some(parse_gff_annotation(line));
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(GWindowsError::IOError(e)));
                }
            }
        }
        None
    }
}

/// Parse a GFF/GTF line into a [`FeatureRecord`].
pub fn parse_gff_annotation(line: &str) -> Result<FeatureRecord, GWindowsError> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < 9 {
        return Err(GWindowsError::GffTooFewColumns(line.to_string()));
    }

    let seqname = columns[0].to_string();
    let start: Position = parse_column(columns[3], line)?;
    let end: Position = parse_column(columns[4], line)?;
    if start == 0 {
        return Err(GWindowsError::InvalidColumnType {
            expected_type: "1-based position".to_string(),
            found_value: columns[3].to_string(),
            line: line.to_string(),
        });
    }
    let strand = Strand::parse_column(columns[6])?;

    let record = FeatureRecord::new(seqname, start - 1, end, Feature::new(columns[2], strand));
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::temp_file_with;

    #[test]
    fn test_parse_gff_coordinates() {
        let record =
            parse_gff_annotation("chr1\tensembl\texon\t101\t200\t.\t+\t.\tgene_id \"g1\";")
                .unwrap();
        assert_eq!((record.start, record.end), (100, 200));
        assert_eq!(record.data, Feature::new("exon", Some(Strand::Forward)));
    }

    #[test]
    fn test_parse_gff_single_base() {
        let record = parse_gff_annotation("chr1\t.\tTSS\t5\t5\t.\t.\t.\t.").unwrap();
        assert_eq!((record.start, record.end), (4, 5));
        assert_eq!(record.data.strand, None);
    }

    #[test]
    fn test_parse_gff_errors() {
        assert!(matches!(
            parse_gff_annotation("chr1\t.\tgene\t5\t10"),
            Err(GWindowsError::GffTooFewColumns(_))
        ));
        assert!(parse_gff_annotation("chr1\t.\tgene\t0\t10\t.\t+\t.\t.").is_err());
        assert!(matches!(
            parse_gff_annotation("chr1\t.\tgene\t5\t10\t.\t*\t.\t."),
            Err(GWindowsError::InvalidStrand(_))
        ));
    }

    #[test]
    fn test_iterator_stops_at_fasta() {
        let file = temp_file_with(
            "genes.gff3",
            "##gff-version 3\nchr1\t.\tgene\t1\t10\t.\t+\t.\tID=a\n##FASTA\n>chr1\nACGT\n",
        );
        let records: Vec<_> = GffAnnotationIterator::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }
}
