//! The [`SparseIntervalIndexer`]: discrete annotations to windows and label tensors.
//!
//! Construction runs a fixed pipeline over the annotation files:
//!
//!  1. merge the files (the source id of an annotation is its file position plus one);
//!  2. keep the features named in the annotation list, remapped to category ids;
//!  3. optionally restrict each feature to its start or stop base;
//!  4. fix the window length;
//!  5. normalize chromosome names, then apply the include/exclude lists;
//!  6. lay out the positive rows, then the negative rows.
//!
//! Rows are addressed through cumulative tables, so neither windows nor labels are
//! stored: [`SparseIntervalIndexer::get`] computes them for the requested rows.

use std::path::PathBuf;
use std::str::FromStr;

use crate::{
    annotations::{AnnotationTable, ChromNaming, Restriction},
    error::GWindowsError,
    index::CumulativeIndex,
    labels::{LabelPolicy, LabelTensor, LabelTensorBuilder},
    negatives::{NegativeRatio, NegativeSampler, NegativeType},
    ranges::{
        coitrees::AnnotationTree, retain_representable, Annotation, Batch, FeatureRecord,
        Strand, WindowCandidate,
    },
    traits::WindowDataset,
    windows::{Augmentation, WindowCalculator, WindowPolicy},
    Position, PositionOffset,
};

/// The window length setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeqLen {
    /// A fixed window length.
    Fixed(Position),
    /// The widest annotation.
    #[default]
    MaxLen,
    /// The widest annotation, with every annotation returned as its own window.
    Real,
}

impl FromStr for SeqLen {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maxlen" | "MAXLEN" => Ok(SeqLen::MaxLen),
            "real" => Ok(SeqLen::Real),
            _ => s
                .parse::<Position>()
                .map(SeqLen::Fixed)
                .map_err(|_| GWindowsError::InvalidChoice(s.to_string(), "sequence length")),
        }
    }
}

/// Configuration of a [`SparseIntervalIndexer`].
#[derive(Clone, Debug, PartialEq)]
pub struct SparseConfig {
    /// The feature names to keep, in category order.
    pub annotation_list: Vec<String>,
    pub seq_len: SeqLen,
    pub augmentation: Augmentation,
    pub restriction: Restriction,
    pub label_policy: LabelPolicy,
    pub chrom_naming: ChromNaming,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    /// Skip labels and negatives.
    pub ignore_targets: bool,
    pub negative_ratio: NegativeRatio,
    pub negative_type: NegativeType,
    pub seed: u64,
}

impl Default for SparseConfig {
    fn default() -> Self {
        Self {
            annotation_list: Vec::new(),
            seq_len: SeqLen::default(),
            augmentation: Augmentation::default(),
            restriction: Restriction::default(),
            label_policy: LabelPolicy::default(),
            chrom_naming: ChromNaming::default(),
            include: None,
            exclude: None,
            ignore_targets: false,
            negative_ratio: NegativeRatio::default(),
            negative_type: NegativeType::default(),
            seed: 0,
        }
    }
}

impl SparseConfig {
    pub fn new(annotation_list: Vec<String>) -> Self {
        Self {
            annotation_list,
            ..Default::default()
        }
    }
}

/// A window resolved from a row, before it is checked to be representable.
#[derive(Clone, Debug)]
struct ResolvedRow {
    chrom: usize,
    start: PositionOffset,
    end: PositionOffset,
    /// The interval labels are computed over.
    label_start: PositionOffset,
    label_end: PositionOffset,
    strand: Option<Strand>,
    positive: bool,
}

/// Random-access windows and labels over discrete annotations.
#[derive(Debug)]
pub struct SparseIntervalIndexer {
    seqnames: Vec<String>,
    annotations: Vec<Vec<Annotation>>,
    trees: Vec<AnnotationTree>,
    calculator: WindowCalculator,
    /// Flat annotation position to (chromosome, annotation).
    annotation_index: CumulativeIndex,
    /// Positive row to (flat annotation position, window offset).
    positives: CumulativeIndex,
    negatives: Option<NegativeSampler>,
    labels: Option<LabelTensorBuilder>,
}

impl SparseIntervalIndexer {
    /// Read annotation files and build the indexer.
    pub fn from_files(filepaths: &[PathBuf], config: &SparseConfig) -> Result<Self, GWindowsError> {
        let table = AnnotationTable::from_files(filepaths, &config.annotation_list)?;
        Self::from_table(table, config)
    }

    /// Build the indexer from already parsed annotation sources, one per file.
    pub fn from_sources(
        sources: Vec<Vec<FeatureRecord>>,
        config: &SparseConfig,
    ) -> Result<Self, GWindowsError> {
        if sources.is_empty() {
            return Err(GWindowsError::NoInputFiles);
        }
        let table = AnnotationTable::from_sources(sources, &config.annotation_list)?;
        Self::from_table(table, config)
    }

    /// Build the indexer from a merged table with remapped labels.
    pub fn from_table(table: AnnotationTable, config: &SparseConfig) -> Result<Self, GWindowsError> {
        let table = table.restrict(config.restriction)?;

        let (length, passthrough) = match config.seq_len {
            SeqLen::Fixed(0) => {
                return Err(GWindowsError::InvalidWindow(
                    "window length must be positive".to_string(),
                ))
            }
            SeqLen::Fixed(length) => (length, false),
            SeqLen::MaxLen => (table.max_width().ok_or(GWindowsError::NoAnnotations)?, false),
            SeqLen::Real => (table.max_width().ok_or(GWindowsError::NoAnnotations)?, true),
        };
        let policy = WindowPolicy::resolve(passthrough, config.augmentation)?;
        let calculator = WindowCalculator::new(length, policy);

        let table = table
            .normalize_names(config.chrom_naming)
            .retain_chroms(config.include.as_deref(), config.exclude.as_deref());

        for (seqname, annotation) in table.iter_annotations() {
            calculator.validate(seqname, annotation.start, annotation.end)?;
        }

        let annotation_index =
            CumulativeIndex::from_counts(table.chroms().map(|(_, annotations)| annotations.len()));
        let positives = CumulativeIndex::from_counts(
            table
                .iter_annotations()
                .map(|(_, a)| calculator.count(a.start, a.end)),
        );

        let negatives = if config.ignore_targets {
            None
        } else {
            Some(NegativeSampler::new(
                &table,
                length,
                config.negative_ratio,
                config.negative_type,
                positives.len(),
                config.seed,
            )?)
        };

        let labels = (!config.ignore_targets).then(|| {
            LabelTensorBuilder::new(
                config.label_policy,
                length as usize,
                table.num_sources(),
                table.num_labels(),
            )
        });

        let trees = table.trees()?;
        log::debug!(
            "sparse index: {} annotations on {} chromosomes, window length {} ({:?}), \
             {} positive and {} negative rows",
            table.len(),
            table.num_chroms(),
            length,
            policy,
            positives.len(),
            negatives.as_ref().map_or(0, |n| n.len())
        );

        Ok(Self {
            seqnames: table.seqnames(),
            annotations: table.chroms().map(|(_, a)| a.clone()).collect(),
            trees,
            calculator,
            annotation_index,
            positives,
            negatives,
            labels,
        })
    }

    /// The window length.
    pub fn length(&self) -> Position {
        self.calculator.length()
    }

    pub fn policy(&self) -> WindowPolicy {
        self.calculator.policy()
    }

    /// The chromosomes with annotations, in row order.
    pub fn seqnames(&self) -> &[String] {
        &self.seqnames
    }

    pub fn num_positives(&self) -> usize {
        self.positives.len()
    }

    pub fn num_negatives(&self) -> usize {
        self.negatives.as_ref().map_or(0, |n| n.len())
    }

    /// The shape of the labels of `num_windows` windows, or `None` when targets are
    /// ignored.
    pub fn label_shape(&self, num_windows: usize) -> Option<Vec<usize>> {
        self.labels.as_ref().map(|l| l.shape(num_windows))
    }

    fn resolve(&self, row: usize) -> Option<ResolvedRow> {
        if row < self.positives.len() {
            let (flat, offset) = self.positives.locate(row)?;
            let (chrom, local) = self.annotation_index.locate(flat)?;
            let annotation = self.annotations[chrom][local];
            let (start, end) = self
                .calculator
                .nth(annotation.start, annotation.end, offset);
            let (label_start, label_end) = self
                .calculator
                .label_window(annotation.start, annotation.end, offset);
            Some(ResolvedRow {
                chrom,
                start,
                end,
                label_start,
                label_end,
                strand: annotation.strand,
                positive: true,
            })
        } else {
            let window = self
                .negatives
                .as_ref()?
                .window(row - self.positives.len())?;
            Some(ResolvedRow {
                chrom: window.chrom,
                start: window.start,
                end: window.end,
                label_start: window.start,
                label_end: window.end,
                strand: window.strand,
                positive: false,
            })
        }
    }
}

impl WindowDataset for SparseIntervalIndexer {
    type Labels = LabelTensor;

    fn len(&self) -> usize {
        self.num_positives() + self.num_negatives()
    }

    fn get(&self, indices: &[usize]) -> Result<Batch<LabelTensor>, GWindowsError> {
        self.check_indices(indices)?;
        let len = self.len();
        let rows = indices
            .iter()
            .map(|&index| {
                self.resolve(index)
                    .ok_or(GWindowsError::IndexOutOfRange { index, len })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let candidates: Vec<WindowCandidate> = rows
            .iter()
            .map(|r| WindowCandidate::new(&self.seqnames[r.chrom], r.start, r.end, r.strand))
            .collect();
        let retained = retain_representable(indices, &candidates);

        let labels = self.labels.as_ref().map(|builder| {
            let mut tensor = builder.zeros(retained.positions.len());
            for (i, &position) in retained.positions.iter().enumerate() {
                let row = &rows[position];
                if row.positive {
                    builder.fill_row(
                        &mut tensor,
                        i,
                        row.label_start,
                        row.label_end,
                        &self.annotations[row.chrom],
                        &self.trees[row.chrom],
                    );
                }
            }
            tensor
        });

        Ok(Batch {
            indices: retained.positions.iter().map(|&p| indices[p]).collect(),
            windows: retained.windows,
            labels,
            warnings: retained.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::{Feature, Window};
    use ndarray::s;

    fn record(seqname: &str, start: Position, end: Position, name: &str, strand: Option<Strand>) -> FeatureRecord {
        FeatureRecord::new(seqname.to_string(), start, end, Feature::new(name, strand))
    }

    fn sources() -> Vec<Vec<FeatureRecord>> {
        vec![
            vec![
                record("chr1", 100, 110, "peak", Some(Strand::Forward)),
                record("chr1", 300, 304, "peak", Some(Strand::Reverse)),
                record("chr2", 50, 58, "peak", Some(Strand::Forward)),
            ],
            vec![record("chr1", 102, 108, "dip", Some(Strand::Forward))],
        ]
    }

    fn config() -> SparseConfig {
        SparseConfig {
            seq_len: SeqLen::Fixed(20),
            negative_type: NegativeType::None,
            ..SparseConfig::new(vec!["peak".to_string(), "dip".to_string()])
        }
    }

    #[test]
    fn test_positive_rows_and_labels() {
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config()).unwrap();
        assert_eq!(indexer.len(), 4);
        assert_eq!(indexer.seqnames(), &["chr1".to_string(), "chr2".to_string()]);

        let batch = indexer.get(&[0, 1, 2, 3]).unwrap();
        assert_eq!(
            batch.windows[0],
            Window::new("chr1", 95, 115).with_strand(Some(Strand::Forward))
        );
        // chromosome order, then file order within a chromosome
        assert_eq!((batch.windows[2].start, batch.windows[2].end), (95, 115));
        assert_eq!((batch.windows[1].start, batch.windows[1].end), (292, 312));
        assert_eq!(batch.windows[3].seqname, "chr2");

        let Some(LabelTensor::PerWindow(labels)) = batch.labels else {
            panic!("expected per-window labels");
        };
        assert_eq!(labels.shape(), &[4, 2, 2]);
        // the first peak window also contains the dip of the second file
        assert_eq!(labels.slice(s![0, .., ..]).to_owned(), ndarray::arr2(&[[1u8, 0], [0, 1]]));
        assert_eq!(labels.slice(s![1, .., ..]).to_owned(), ndarray::arr2(&[[1u8, 0], [0, 0]]));
    }

    #[test]
    fn test_maxlen_and_real() {
        let config = SparseConfig {
            seq_len: SeqLen::MaxLen,
            ..config()
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        assert_eq!(indexer.length(), 10);

        let config = SparseConfig {
            seq_len: SeqLen::Real,
            ..config
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        assert_eq!(indexer.policy(), WindowPolicy::Passthrough);
        let batch = indexer.get(&[1]).unwrap();
        assert_eq!((batch.windows[0].start, batch.windows[0].end), (300, 304));

        let config = SparseConfig {
            augmentation: Augmentation::All,
            ..config
        };
        let result = SparseIntervalIndexer::from_sources(sources(), &config);
        assert!(matches!(
            result,
            Err(GWindowsError::AugmentationWithPassthrough)
        ));
    }

    #[test]
    fn test_real_labels_follow_centered_window() {
        let config = SparseConfig {
            seq_len: SeqLen::Real,
            label_policy: LabelPolicy::Seq2Seq,
            ..config()
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        assert_eq!(indexer.length(), 10);
        let batch = indexer.get(&[1]).unwrap();
        assert_eq!((batch.windows[0].start, batch.windows[0].end), (300, 304));

        let Some(LabelTensor::PerBase(labels)) = batch.labels else {
            panic!("expected per-base labels");
        };
        assert_eq!(labels.shape(), &[1, 10, 2, 2]);
        // [300, 304) padded to [297, 307): three bases on each side
        assert_eq!(
            labels.slice(s![0, .., 0, 0]).to_vec(),
            vec![0, 0, 0, 1, 1, 1, 1, 0, 0, 0]
        );
    }

    #[test]
    fn test_no_annotations_left() {
        let config = SparseConfig {
            seq_len: SeqLen::MaxLen,
            ..SparseConfig::new(vec!["enhancer".to_string()])
        };
        let result = SparseIntervalIndexer::from_sources(sources(), &config);
        assert!(matches!(result, Err(GWindowsError::NoAnnotations)));
    }

    #[test]
    fn test_annotation_exceeds_window() {
        let config = SparseConfig {
            seq_len: SeqLen::Fixed(5),
            ..config()
        };
        let result = SparseIntervalIndexer::from_sources(sources(), &config);
        assert!(matches!(
            result,
            Err(GWindowsError::AnnotationExceedsWindow(..))
        ));
    }

    #[test]
    fn test_augmented_rows() {
        let config = SparseConfig {
            augmentation: Augmentation::All,
            ..config()
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        // 11 + 17 + 15 windows on chr1, 13 on chr2
        assert_eq!(indexer.len(), 11 + 17 + 15 + 13);
        let batch = indexer.get(&[0, 10, 11]).unwrap();
        assert_eq!((batch.windows[0].start, batch.windows[0].end), (90, 110));
        assert_eq!((batch.windows[1].start, batch.windows[1].end), (100, 120));
        assert_eq!((batch.windows[2].start, batch.windows[2].end), (284, 304));
    }

    #[test]
    fn test_all_negatives_have_zero_labels() {
        let config = SparseConfig {
            negative_ratio: NegativeRatio::All,
            negative_type: NegativeType::Real,
            ..config()
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        // chr1: starts 1..=79, 110..=279 and 304; chr2: starts 1..=29 and 58
        assert_eq!(indexer.num_negatives(), 79 + 170 + 1 + 29 + 1);

        let indices: Vec<usize> = (indexer.num_positives()..indexer.len()).collect();
        let batch = indexer.get(&indices).unwrap();
        assert_eq!(batch.len(), indices.len());
        assert!(batch.windows.iter().all(|w| w.end - w.start == 20));
        assert!(batch.windows.iter().all(|w| w.strand.is_some()));
        let Some(LabelTensor::PerWindow(labels)) = batch.labels else {
            panic!("expected per-window labels");
        };
        assert_eq!(labels.sum(), 0);
    }

    #[test]
    fn test_count_negatives() {
        let config = SparseConfig {
            negative_ratio: NegativeRatio::Count(2),
            negative_type: NegativeType::Real,
            ..config()
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        assert_eq!(indexer.num_positives(), 4);
        assert_eq!(indexer.num_negatives(), 8);
        assert_eq!(indexer.len(), 12);
    }

    #[test]
    fn test_ignore_targets() {
        let config = SparseConfig {
            ignore_targets: true,
            negative_type: NegativeType::Real,
            ..config()
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        assert_eq!(indexer.len(), 4);
        let batch = indexer.get(&[0]).unwrap();
        assert!(batch.labels.is_none());
        assert!(indexer.label_shape(1).is_none());
    }

    #[test]
    fn test_repeated_get_is_pure() {
        let config = SparseConfig {
            negative_ratio: NegativeRatio::All,
            negative_type: NegativeType::Real,
            ..config()
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        let first = indexer.get(&[5, 5, 5]).unwrap();
        let second = indexer.get(&[5, 5, 5]).unwrap();
        assert_eq!(first.windows, second.windows);
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.windows[0], first.windows[2]);
    }

    #[test]
    fn test_include_chroms() {
        let config = SparseConfig {
            include: Some(vec!["chr1".to_string()]),
            ..config()
        };
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config).unwrap();
        assert_eq!(indexer.len(), 3);
        let batch = indexer.get(&[0, 1, 2]).unwrap();
        assert!(batch.windows.iter().all(|w| w.seqname == "chr1"));
    }

    #[test]
    fn test_index_out_of_range() {
        let indexer = SparseIntervalIndexer::from_sources(sources(), &config()).unwrap();
        let result = indexer.get(&[0, 4]);
        assert!(matches!(
            result,
            Err(GWindowsError::IndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_overflowing_window_is_dropped() {
        let sources = vec![vec![
            record("chr1", 2, 4, "peak", None),
            record("chr1", 40, 44, "peak", None),
        ]];
        let config = SparseConfig {
            seq_len: SeqLen::Fixed(20),
            negative_type: NegativeType::None,
            ..SparseConfig::new(vec!["peak".to_string()])
        };
        let indexer = SparseIntervalIndexer::from_sources(sources, &config).unwrap();
        let batch = indexer.get(&[0, 1]).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.indices, vec![1]);
        assert_eq!(batch.warnings.len(), 1);
        assert_eq!(batch.warnings[0].index, 0);
        assert_eq!(batch.labels.unwrap().len(), 1);
    }

    #[test]
    fn test_chrom_naming() {
        let sources = vec![vec![record("1", 20, 30, "peak", None)]];
        let config = SparseConfig {
            chrom_naming: ChromNaming::Ucsc,
            negative_type: NegativeType::None,
            ..SparseConfig::new(vec!["peak".to_string()])
        };
        let indexer = SparseIntervalIndexer::from_sources(sources, &config).unwrap();
        assert_eq!(indexer.get(&[0]).unwrap().windows[0].seqname, "chr1");
    }

    #[test]
    fn test_indexer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SparseIntervalIndexer>();
    }
}
