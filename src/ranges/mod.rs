//! Range types: parsed records, annotations, windows, and batches of windows.
//!

use std::fmt;
use std::str::FromStr;

use crate::{error::GWindowsError, traits::GenericRange, Position, PositionOffset};

pub mod coitrees;

/// Nucleotide strand enum type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Parse a strand column, where `'.'` means no strand.
    pub fn parse_column(value: &str) -> Result<Option<Strand>, GWindowsError> {
        match value {
            "." => Ok(None),
            other => other.parse().map(Some),
        }
    }

    /// Map a boolean draw onto a strand (used for negative windows).
    pub fn from_forward(forward: bool) -> Self {
        if forward {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

impl FromStr for Strand {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            _ => Err(GWindowsError::InvalidStrand(s.to_string())),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// Represents a parsed range entry, possibly containing some data.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomicRangeRecord<U> {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub data: U,
}

impl<U> GenomicRangeRecord<U> {
    pub fn new(seqname: String, start: Position, end: Position, data: U) -> Self {
        Self {
            seqname,
            start,
            end,
            data,
        }
    }
}

impl<U: Clone> GenomicRangeRecord<U> {
    /// Check the record is a non-empty, 0-indexed right-exclusive range.
    pub fn validate(&self) -> Result<(), GWindowsError> {
        validate_range(self.start, self.end)
    }
}

impl<U: Clone> GenericRange for GenomicRangeRecord<U> {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

/// The data parsed from an annotation file row, past the first three range
/// columns: the feature name (the BED name, or the GFF feature type) and an
/// optional strand.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: String,
    pub strand: Option<Strand>,
}

impl Feature {
    pub fn new(name: impl Into<String>, strand: Option<Strand>) -> Self {
        Self {
            name: name.into(),
            strand,
        }
    }
}

/// A parsed annotation record, as supplied by the annotation file parsers.
pub type FeatureRecord = GenomicRangeRecord<Feature>;

/// A normalized annotation within a single chromosome.
///
/// `label` is the 1-indexed position of the feature name in the annotation list and
/// `source` the 1-indexed position of the file it came from; 0 is reserved for
/// negative windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub start: Position,
    pub end: Position,
    pub strand: Option<Strand>,
    pub label: usize,
    pub source: usize,
}

impl Annotation {
    pub fn new(
        start: Position,
        end: Position,
        strand: Option<Strand>,
        label: usize,
        source: usize,
    ) -> Self {
        Self {
            start,
            end,
            strand,
            label,
            source,
        }
    }
}

impl GenericRange for Annotation {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

/// A materialized window: the coordinates of one training example.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Window {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub strand: Option<Strand>,
}

impl Window {
    pub fn new(seqname: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            seqname: seqname.into(),
            start,
            end,
            strand: None,
        }
    }

    pub fn with_strand(mut self, strand: Option<Strand>) -> Self {
        self.strand = strand;
        self
    }

    /// Zero-length windows are placeholders for randomly generated sequence.
    pub fn is_placeholder(&self) -> bool {
        self.start == self.end
    }
}

impl GenericRange for Window {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strand = self.strand.map_or(".".to_string(), |s| s.to_string());
        write!(f, "{}\t{}\t{}\t{}", self.seqname, self.start, self.end, strand)
    }
}

/// A window in signed coordinates, before it has been checked to be representable
/// as a [`Window`].
#[derive(Debug, Clone, PartialEq)]
pub struct WindowCandidate<'a> {
    pub seqname: &'a str,
    pub start: PositionOffset,
    pub end: PositionOffset,
    pub strand: Option<Strand>,
}

impl<'a> WindowCandidate<'a> {
    pub fn new(
        seqname: &'a str,
        start: PositionOffset,
        end: PositionOffset,
        strand: Option<Strand>,
    ) -> Self {
        Self {
            seqname,
            start,
            end,
            strand,
        }
    }

    /// Convert into a [`Window`], or `None` if either coordinate does not fit a
    /// [`Position`] (e.g. a window padded past the chromosome start).
    pub fn to_window(&self) -> Option<Window> {
        let start = Position::try_from(self.start).ok()?;
        let end = Position::try_from(self.end).ok()?;
        if start > end {
            return None;
        }
        Some(Window::new(self.seqname, start, end).with_strand(self.strand))
    }
}

/// A non-fatal event: the window at row `index` could not be represented and was
/// dropped from a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DataOverflowWarning {
    pub index: usize,
    pub seqname: String,
    pub start: PositionOffset,
    pub end: PositionOffset,
}

impl fmt::Display for DataOverflowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} ({}:{}-{}) is out of range and has been removed",
            self.index, self.seqname, self.start, self.end
        )
    }
}

/// The windows, labels, and warnings returned for one batch of row indices.
///
/// `indices` holds the requested row indices that were kept, aligned with
/// `windows` and the first axis of `labels`.
#[derive(Debug, Clone)]
pub struct Batch<L> {
    pub windows: Vec<Window>,
    pub labels: Option<L>,
    pub indices: Vec<usize>,
    pub warnings: Vec<DataOverflowWarning>,
}

impl<L> Batch<L> {
    /// Get the number of retained windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Return whether no windows were retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert the labels, keeping the windows, indices, and warnings.
    pub fn map_labels<M, F>(self, f: F) -> Batch<M>
    where
        F: FnOnce(L) -> M,
    {
        Batch {
            windows: self.windows,
            labels: self.labels.map(f),
            indices: self.indices,
            warnings: self.warnings,
        }
    }
}

/// The windows kept from a set of candidates, plus where they came from.
pub(crate) struct Retained {
    pub windows: Vec<Window>,
    /// Positions into the candidate list.
    pub positions: Vec<usize>,
    pub warnings: Vec<DataOverflowWarning>,
}

/// Convert candidates to windows, dropping (and logging) those that cannot be
/// represented. `rows` are the dataset row indices of the candidates.
pub(crate) fn retain_representable(rows: &[usize], candidates: &[WindowCandidate]) -> Retained {
    let mut windows = Vec::with_capacity(candidates.len());
    let mut positions = Vec::with_capacity(candidates.len());
    let mut warnings = Vec::new();
    for (i, (row, candidate)) in rows.iter().zip(candidates).enumerate() {
        match candidate.to_window() {
            Some(window) => {
                windows.push(window);
                positions.push(i);
            }
            None => {
                let warning = DataOverflowWarning {
                    index: *row,
                    seqname: candidate.seqname.to_string(),
                    start: candidate.start,
                    end: candidate.end,
                };
                log::warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }
    Retained {
        windows,
        positions,
        warnings,
    }
}

/// Validates that a range is non-empty and 0-indexed right-exclusive.
pub fn validate_range(start: Position, end: Position) -> Result<(), GWindowsError> {
    if start >= end {
        return Err(GWindowsError::InvalidGenomicRange(start, end));
    }
    Ok(())
}

/// Check that `[start, end)` lies within a sequence of `length`, returning the
/// range as `usize` bounds for slicing.
pub fn try_range(
    start: PositionOffset,
    end: PositionOffset,
    length: Position,
) -> Result<std::ops::Range<usize>, GWindowsError> {
    if start < 0 || start > end || end > length as PositionOffset {
        return Err(GWindowsError::InvalidGenomicRangeForSequence(
            start, end, length,
        ));
    }
    Ok(start as usize..end as usize)
}
