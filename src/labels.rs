//! Multi-hot label tensors for windows.
//!
//! A label tensor has one row per window, and its last two axes are the annotation
//! source (file) and category. Under [`LabelPolicy::Seq2Seq`] there is an additional
//! per-base axis of the window length.

use ndarray::{concatenate, Array3, Array4, Axis};
use std::str::FromStr;

use crate::{
    error::GWindowsError,
    ranges::{coitrees::AnnotationTree, Annotation},
    PositionOffset,
};

/// When a window is labelled positive for an annotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Per-base labels over the window.
    Seq2Seq,
    /// The annotation lies entirely within the window.
    #[default]
    MatchAll,
    /// The annotation overlaps the window.
    MatchAny,
}

impl FromStr for LabelPolicy {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seq2seq" => Ok(LabelPolicy::Seq2Seq),
            "match_all" | "match-all" => Ok(LabelPolicy::MatchAll),
            "match_any" | "match-any" => Ok(LabelPolicy::MatchAny),
            _ => Err(GWindowsError::InvalidChoice(s.to_string(), "label policy")),
        }
    }
}

/// Dense `u8` labels for a batch of windows.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelTensor {
    /// Shape `(windows, sources, labels)`.
    PerWindow(Array3<u8>),
    /// Shape `(windows, length, sources, labels)`.
    PerBase(Array4<u8>),
}

impl LabelTensor {
    /// The number of windows.
    pub fn len(&self) -> usize {
        match self {
            LabelTensor::PerWindow(array) => array.len_of(Axis(0)),
            LabelTensor::PerBase(array) => array.len_of(Axis(0)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            LabelTensor::PerWindow(array) => array.shape(),
            LabelTensor::PerBase(array) => array.shape(),
        }
    }

    /// The rows at `positions`, in that order.
    pub fn select(&self, positions: &[usize]) -> LabelTensor {
        match self {
            LabelTensor::PerWindow(array) => LabelTensor::PerWindow(array.select(Axis(0), positions)),
            LabelTensor::PerBase(array) => LabelTensor::PerBase(array.select(Axis(0), positions)),
        }
    }

    /// Stack the rows of several tensors of the same kind and trailing shape.
    pub fn concatenate(tensors: &[LabelTensor]) -> Result<Option<LabelTensor>, GWindowsError> {
        let Some(first) = tensors.first() else {
            return Ok(None);
        };
        let stacked = match first {
            LabelTensor::PerWindow(_) => {
                let views: Vec<_> = tensors
                    .iter()
                    .filter_map(|t| match t {
                        LabelTensor::PerWindow(array) => Some(array.view()),
                        LabelTensor::PerBase(_) => None,
                    })
                    .collect();
                LabelTensor::PerWindow(concatenate(Axis(0), &views)?)
            }
            LabelTensor::PerBase(_) => {
                let views: Vec<_> = tensors
                    .iter()
                    .filter_map(|t| match t {
                        LabelTensor::PerBase(array) => Some(array.view()),
                        LabelTensor::PerWindow(_) => None,
                    })
                    .collect();
                LabelTensor::PerBase(concatenate(Axis(0), &views)?)
            }
        };
        if stacked.len() != tensors.iter().map(|t| t.len()).sum::<usize>() {
            return Err(GWindowsError::InvalidWindow(
                "cannot stack per-window and per-base labels".to_string(),
            ));
        }
        Ok(Some(stacked))
    }
}

/// Builds [`LabelTensor`]s for windows against a chromosome's annotations.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelTensorBuilder {
    policy: LabelPolicy,
    length: usize,
    num_sources: usize,
    num_labels: usize,
}

impl LabelTensorBuilder {
    pub fn new(policy: LabelPolicy, length: usize, num_sources: usize, num_labels: usize) -> Self {
        Self {
            policy,
            length,
            num_sources,
            num_labels,
        }
    }

    pub fn policy(&self) -> LabelPolicy {
        self.policy
    }

    /// The shape of the labels of `num_windows` windows.
    pub fn shape(&self, num_windows: usize) -> Vec<usize> {
        match self.policy {
            LabelPolicy::Seq2Seq => vec![num_windows, self.length, self.num_sources, self.num_labels],
            _ => vec![num_windows, self.num_sources, self.num_labels],
        }
    }

    /// An all-zero tensor for `num_windows` windows.
    pub fn zeros(&self, num_windows: usize) -> LabelTensor {
        match self.policy {
            LabelPolicy::Seq2Seq => LabelTensor::PerBase(Array4::zeros((
                num_windows,
                self.length,
                self.num_sources,
                self.num_labels,
            ))),
            _ => LabelTensor::PerWindow(Array3::zeros((
                num_windows,
                self.num_sources,
                self.num_labels,
            ))),
        }
    }

    /// Set the labels of row `row` for the window `[start, end)`.
    ///
    /// `tree` must index `annotations`. Annotation `source` and `label` ids are
    /// 1-indexed.
    pub fn fill_row(
        &self,
        tensor: &mut LabelTensor,
        row: usize,
        start: PositionOffset,
        end: PositionOffset,
        annotations: &[Annotation],
        tree: &AnnotationTree,
    ) {
        tree.query(start, end, |i| {
            let annotation = &annotations[i];
            let ann_start = annotation.start as PositionOffset;
            let ann_end = annotation.end as PositionOffset;
            let source = annotation.source - 1;
            let label = annotation.label - 1;
            match (self.policy, &mut *tensor) {
                (LabelPolicy::Seq2Seq, LabelTensor::PerBase(array)) => {
                    let first = (ann_start.max(start) - start).max(0) as usize;
                    let last = ((ann_end.min(end) - start) as usize).min(self.length);
                    for pos in first..last {
                        array[[row, pos, source, label]] = 1;
                    }
                }
                (LabelPolicy::MatchAll, LabelTensor::PerWindow(array)) => {
                    if ann_start >= start && ann_end <= end {
                        array[[row, source, label]] = 1;
                    }
                }
                (LabelPolicy::MatchAny, LabelTensor::PerWindow(array)) => {
                    // every tree hit overlaps the window
                    array[[row, source, label]] = 1;
                }
                _ => {}
            }
        });
    }

    /// Build the labels of several windows on one chromosome.
    pub fn build(
        &self,
        windows: &[(PositionOffset, PositionOffset)],
        annotations: &[Annotation],
        tree: &AnnotationTree,
    ) -> LabelTensor {
        let mut tensor = self.zeros(windows.len());
        for (row, &(start, end)) in windows.iter().enumerate() {
            self.fill_row(&mut tensor, row, start, end, annotations, tree);
        }
        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn setup() -> (Vec<Annotation>, AnnotationTree) {
        let annotations = vec![Annotation::new(10, 20, None, 1, 1)];
        let tree = AnnotationTree::new(&annotations).unwrap();
        (annotations, tree)
    }

    #[test]
    fn test_match_all_and_match_any() {
        let (annotations, tree) = setup();

        let all = LabelTensorBuilder::new(LabelPolicy::MatchAll, 20, 1, 1);
        let any = LabelTensorBuilder::new(LabelPolicy::MatchAny, 20, 1, 1);
        let windows = vec![(5, 25), (12, 25), (30, 50)];

        let LabelTensor::PerWindow(labels) = all.build(&windows, &annotations, &tree) else {
            panic!("expected per-window labels");
        };
        assert_eq!(labels.shape(), &[3, 1, 1]);
        assert_eq!(labels[[0, 0, 0]], 1);
        assert_eq!(labels[[1, 0, 0]], 0);
        assert_eq!(labels[[2, 0, 0]], 0);

        let LabelTensor::PerWindow(labels) = any.build(&windows, &annotations, &tree) else {
            panic!("expected per-window labels");
        };
        assert_eq!(labels[[0, 0, 0]], 1);
        assert_eq!(labels[[1, 0, 0]], 1);
        assert_eq!(labels[[2, 0, 0]], 0);
    }

    #[test]
    fn test_seq2seq_relative_positions() {
        let (annotations, tree) = setup();
        let builder = LabelTensorBuilder::new(LabelPolicy::Seq2Seq, 10, 1, 1);
        let LabelTensor::PerBase(labels) = builder.build(&[(5, 15)], &annotations, &tree) else {
            panic!("expected per-base labels");
        };
        assert_eq!(labels.shape(), &[1, 10, 1, 1]);
        let column: Vec<u8> = labels.slice(s![0, .., 0, 0]).to_vec();
        assert_eq!(column, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_seq2seq_clipped_window_before_zero() {
        let annotations = vec![Annotation::new(0, 3, None, 2, 2)];
        let tree = AnnotationTree::new(&annotations).unwrap();
        let builder = LabelTensorBuilder::new(LabelPolicy::Seq2Seq, 6, 2, 2);
        let LabelTensor::PerBase(labels) = builder.build(&[(-2, 4)], &annotations, &tree) else {
            panic!("expected per-base labels");
        };
        let column: Vec<u8> = labels.slice(s![0, .., 1, 1]).to_vec();
        assert_eq!(column, vec![0, 0, 1, 1, 1, 0]);
        assert_eq!(labels.slice(s![0, .., 0, ..]).sum(), 0);
    }

    #[test]
    fn test_multiple_hits_are_idempotent() {
        let annotations = vec![
            Annotation::new(10, 12, None, 1, 1),
            Annotation::new(11, 14, None, 1, 1),
            Annotation::new(13, 15, None, 2, 1),
        ];
        let tree = AnnotationTree::new(&annotations).unwrap();
        let builder = LabelTensorBuilder::new(LabelPolicy::MatchAny, 10, 1, 2);
        let LabelTensor::PerWindow(labels) = builder.build(&[(8, 18)], &annotations, &tree) else {
            panic!("expected per-window labels");
        };
        assert_eq!(labels.slice(s![0, 0, ..]).to_vec(), vec![1, 1]);
    }

    #[test]
    fn test_concatenate() {
        let builder = LabelTensorBuilder::new(LabelPolicy::MatchAll, 10, 2, 3);
        let stacked = LabelTensor::concatenate(&[builder.zeros(2), builder.zeros(3)])
            .unwrap()
            .unwrap();
        assert_eq!(stacked.shape(), &[5, 2, 3]);
        assert!(LabelTensor::concatenate(&[]).unwrap().is_none());
        assert_eq!(stacked.select(&[4, 0]).shape(), &[2, 2, 3]);
        assert_eq!("match-any".parse::<LabelPolicy>().unwrap(), LabelPolicy::MatchAny);
    }
}
