//! Negative windows: windows that neither overlap nor adjoin any annotation.
//!
//! On each chromosome the candidate window starts are `1..=max_end`, where `max_end`
//! is the largest annotation end. Every start in `[ann.start - L, ann.end)` is removed
//! for each annotation. The remaining starts are stored as gaps (runs of consecutive
//! starts), so the negative space costs memory proportional to the number of
//! annotations, not to chromosome length.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::str::FromStr;

use crate::{
    annotations::AnnotationTable, error::GWindowsError, index::CumulativeIndex, ranges::Strand,
    Position, PositionOffset,
};

/// How many negative windows to add.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NegativeRatio {
    /// Every window of the negative space.
    All,
    /// This many negatives per positive row.
    Count(usize),
}

impl Default for NegativeRatio {
    fn default() -> Self {
        NegativeRatio::Count(1)
    }
}

impl FromStr for NegativeRatio {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(NegativeRatio::All);
        }
        s.parse::<usize>()
            .map(NegativeRatio::Count)
            .map_err(|_| GWindowsError::InvalidNegativeRatio(s.to_string()))
    }
}

/// Where negative windows come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NegativeType {
    /// Windows from the annotation-free parts of the genome.
    #[default]
    Real,
    /// Zero-length placeholder windows, for randomly generated sequence.
    Random,
    /// No negative windows.
    None,
}

impl FromStr for NegativeType {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real" => Ok(NegativeType::Real),
            "random" => Ok(NegativeType::Random),
            "none" => Ok(NegativeType::None),
            _ => Err(GWindowsError::InvalidNegativeType(s.to_string())),
        }
    }
}

/// A run of valid negative window starts `[start, end)` on a chromosome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gap {
    pub chrom: usize,
    pub start: Position,
    pub end: Position,
}

impl Gap {
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A negative window. `chrom` is the position of its chromosome in the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NegativeWindow {
    pub chrom: usize,
    pub start: PositionOffset,
    pub end: PositionOffset,
    pub strand: Option<Strand>,
}

/// Carve the gaps of valid negative window starts from each chromosome of a table.
pub fn negative_gaps(table: &AnnotationTable, length: Position) -> Vec<Gap> {
    let length = length as PositionOffset;
    let mut gaps = Vec::new();
    for (chrom, (seqname, annotations)) in table.chroms().enumerate() {
        let Some(max_end) = table.max_end(seqname) else {
            continue;
        };

        let mut exclusions: Vec<(PositionOffset, PositionOffset)> = annotations
            .iter()
            .map(|a| (a.start as PositionOffset - length, a.end as PositionOffset))
            .collect();
        exclusions.sort_unstable();

        // complement the merged exclusions within the candidates [1, max_end + 1)
        let mut cursor: PositionOffset = 1;
        let limit = max_end as PositionOffset + 1;
        for (start, end) in exclusions {
            if start > cursor {
                push_gap(&mut gaps, chrom, cursor, start.min(limit));
            }
            cursor = cursor.max(end);
            if cursor >= limit {
                break;
            }
        }
        push_gap(&mut gaps, chrom, cursor, limit);
    }
    gaps
}

fn push_gap(gaps: &mut Vec<Gap>, chrom: usize, start: PositionOffset, end: PositionOffset) {
    if start < end {
        gaps.push(Gap {
            chrom,
            start: start as Position,
            end: end as Position,
        });
    }
}

#[derive(Clone, Debug)]
enum NegativeRows {
    None,
    /// Every window of the negative space, addressed lazily.
    All {
        gaps: Vec<Gap>,
        index: CumulativeIndex,
        stranded: bool,
    },
    /// Explicitly drawn windows.
    Drawn(Vec<NegativeWindow>),
}

/// The negative rows of a sparse dataset.
#[derive(Clone, Debug)]
pub struct NegativeSampler {
    length: Position,
    seed: u64,
    rows: NegativeRows,
}

impl NegativeSampler {
    /// Build the negatives for a table whose positive windows fill `positive_rows` rows.
    pub fn new(
        table: &AnnotationTable,
        length: Position,
        ratio: NegativeRatio,
        negative_type: NegativeType,
        positive_rows: usize,
        seed: u64,
    ) -> Result<Self, GWindowsError> {
        let stranded = table.is_stranded();
        let mut rng = StdRng::seed_from_u64(seed);

        let rows = match (negative_type, ratio) {
            (NegativeType::None, _) => NegativeRows::None,
            (NegativeType::Random, NegativeRatio::All) => {
                return Err(GWindowsError::RandomNegativesRequireCount)
            }
            (NegativeType::Random, NegativeRatio::Count(k)) => {
                let windows = (0..k * positive_rows)
                    .map(|_| NegativeWindow {
                        chrom: 0,
                        start: 0,
                        end: 0,
                        strand: draw_strand(&mut rng, stranded),
                    })
                    .collect();
                NegativeRows::Drawn(windows)
            }
            (NegativeType::Real, ratio) => {
                let gaps = negative_gaps(table, length);
                let index = CumulativeIndex::from_counts(gaps.iter().map(|g| g.len()));
                log::debug!(
                    "negative space: {} windows in {} gaps",
                    index.len(),
                    gaps.len()
                );
                match ratio {
                    NegativeRatio::All => NegativeRows::All {
                        gaps,
                        index,
                        stranded,
                    },
                    NegativeRatio::Count(k) => {
                        let requested = k * positive_rows;
                        if index.is_empty() {
                            if requested > 0 {
                                log::warn!(
                                    "no room for negative windows of length {}; \
                                     {} requested negatives were not added",
                                    length,
                                    requested
                                );
                            }
                            NegativeRows::None
                        } else {
                            let len = index.len();
                            let windows = (0..requested)
                                .map(|_| {
                                    let row = rng.gen_range(0..len);
                                    let strand = draw_strand(&mut rng, stranded);
                                    gap_window(&gaps, &index, row, length, strand)
                                        .ok_or(GWindowsError::IndexOutOfRange { index: row, len })
                                })
                                .collect::<Result<Vec<_>, _>>()?;
                            NegativeRows::Drawn(windows)
                        }
                    }
                }
            }
        };

        Ok(Self { length, seed, rows })
    }

    /// The number of negative rows.
    pub fn len(&self) -> usize {
        match &self.rows {
            NegativeRows::None => 0,
            NegativeRows::All { index, .. } => index.len(),
            NegativeRows::Drawn(windows) => windows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The window of negative row `row`, or `None` if out of range.
    pub fn window(&self, row: usize) -> Option<NegativeWindow> {
        match &self.rows {
            NegativeRows::None => None,
            NegativeRows::All {
                gaps,
                index,
                stranded,
            } => {
                // a per-row RNG keeps lookups pure
                let mut rng = StdRng::seed_from_u64(self.seed ^ row as u64);
                let strand = draw_strand(&mut rng, *stranded);
                gap_window(gaps, index, row, self.length, strand)
            }
            NegativeRows::Drawn(windows) => windows.get(row).cloned(),
        }
    }
}

fn draw_strand(rng: &mut StdRng, stranded: bool) -> Option<Strand> {
    stranded.then(|| Strand::from_forward(rng.gen_bool(0.5)))
}

fn gap_window(
    gaps: &[Gap],
    index: &CumulativeIndex,
    row: usize,
    length: Position,
    strand: Option<Strand>,
) -> Option<NegativeWindow> {
    let (bucket, offset) = index.locate(row)?;
    let gap = &gaps[bucket];
    let start = gap.start as PositionOffset + offset as PositionOffset;
    Some(NegativeWindow {
        chrom: gap.chrom,
        start,
        end: start + length as PositionOffset,
        strand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::Annotation;

    fn table(annotations: &[(&str, Position, Position, Option<Strand>)]) -> AnnotationTable {
        let mut table = AnnotationTable::new(1, 1);
        for &(seqname, start, end, strand) in annotations {
            table.push(seqname.to_string(), Annotation::new(start, end, strand, 1, 1));
        }
        table
    }

    #[test]
    fn test_negative_gaps() {
        let table = table(&[("chr1", 20, 30, None), ("chr1", 60, 70, None)]);
        let gaps = negative_gaps(&table, 10);
        // excluded starts: [10, 30) and [50, 70); candidates 1..=70
        assert_eq!(
            gaps,
            vec![
                Gap { chrom: 0, start: 1, end: 10 },
                Gap { chrom: 0, start: 30, end: 50 },
                Gap { chrom: 0, start: 70, end: 71 },
            ]
        );
    }

    #[test]
    fn test_negative_gaps_overlapping_exclusions() {
        let table = table(&[
            ("chr1", 5, 30, None),
            ("chr1", 12, 18, None),
            ("chr2", 3, 8, None),
        ]);
        let gaps = negative_gaps(&table, 10);
        assert_eq!(
            gaps,
            vec![
                Gap { chrom: 0, start: 30, end: 31 },
                Gap { chrom: 1, start: 8, end: 9 },
            ]
        );
    }

    #[test]
    fn test_negative_starts_avoid_annotations() {
        let annotations = [
            ("chr1", 40, 45, None),
            ("chr1", 100, 130, None),
            ("chr1", 210, 220, None),
            ("chr2", 15, 25, None),
        ];
        let length = 16;
        let table = table(&annotations);
        let sampler =
            NegativeSampler::new(&table, length, NegativeRatio::All, NegativeType::Real, 4, 0)
                .unwrap();
        assert!(!sampler.is_empty());
        let seqnames = table.seqnames();
        for row in 0..sampler.len() {
            let window = sampler.window(row).unwrap();
            assert_eq!(window.end - window.start, length as PositionOffset);
            for &(seqname, start, end, _) in &annotations {
                if seqnames[window.chrom] != seqname {
                    continue;
                }
                let excluded = (start as PositionOffset - length as PositionOffset)
                    ..(end as PositionOffset);
                assert!(!excluded.contains(&window.start));
            }
        }
        assert!(sampler.window(sampler.len()).is_none());
    }

    #[test]
    fn test_count_ratio() {
        let table = table(&[("chr1", 200, 210, None)]);
        let sampler = NegativeSampler::new(
            &table,
            20,
            NegativeRatio::Count(2),
            NegativeType::Real,
            3,
            42,
        )
        .unwrap();
        assert_eq!(sampler.len(), 6);
        let again = NegativeSampler::new(
            &table,
            20,
            NegativeRatio::Count(2),
            NegativeType::Real,
            3,
            42,
        )
        .unwrap();
        for row in 0..6 {
            assert_eq!(sampler.window(row), again.window(row));
            let start = sampler.window(row).unwrap().start;
            assert!(start < 180 || start == 210);
        }
    }

    #[test]
    fn test_count_ratio_draws_every_requested_window() {
        // gaps [1, 10) and [30, 31)
        let table = table(&[("chr1", 20, 30, None)]);
        let sampler = NegativeSampler::new(
            &table,
            10,
            NegativeRatio::Count(5),
            NegativeType::Real,
            4,
            7,
        )
        .unwrap();
        assert_eq!(sampler.len(), 20);
        for row in 0..20 {
            let window = sampler.window(row).unwrap();
            assert!((1..10).contains(&window.start) || window.start == 30);
            assert_eq!(window.end - window.start, 10);
        }
    }

    #[test]
    fn test_random_negatives() {
        let table = table(&[("chr2", 10, 20, Some(Strand::Forward))]);
        let sampler = NegativeSampler::new(
            &table,
            20,
            NegativeRatio::Count(3),
            NegativeType::Random,
            2,
            0,
        )
        .unwrap();
        assert_eq!(sampler.len(), 6);
        let window = sampler.window(0).unwrap();
        assert_eq!((window.chrom, window.start, window.end), (0, 0, 0));
        assert!(window.strand.is_some());

        let result = NegativeSampler::new(
            &table,
            20,
            NegativeRatio::All,
            NegativeType::Random,
            2,
            0,
        );
        assert!(matches!(
            result,
            Err(GWindowsError::RandomNegativesRequireCount)
        ));
    }

    #[test]
    fn test_negative_space_adjoining_last_annotation() {
        let table = table(&[("chr1", 0, 10, None)]);
        let sampler = NegativeSampler::new(
            &table,
            20,
            NegativeRatio::Count(1),
            NegativeType::Real,
            1,
            0,
        )
        .unwrap();
        // starts 1..=9 are excluded, the start at the annotation end is not
        assert_eq!(sampler.len(), 1);
        assert_eq!(sampler.window(0).unwrap().start, 10);

        let none = NegativeSampler::new(
            &table,
            20,
            NegativeRatio::Count(1),
            NegativeType::None,
            1,
            0,
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_parse_ratio_and_type() {
        assert_eq!("all".parse::<NegativeRatio>().unwrap(), NegativeRatio::All);
        assert_eq!("3".parse::<NegativeRatio>().unwrap(), NegativeRatio::Count(3));
        assert!(matches!(
            "half".parse::<NegativeRatio>(),
            Err(GWindowsError::InvalidNegativeRatio(_))
        ));
        assert_eq!("random".parse::<NegativeType>().unwrap(), NegativeType::Random);
        assert!(matches!(
            "fake".parse::<NegativeType>(),
            Err(GWindowsError::InvalidNegativeType(_))
        ));
    }
}
