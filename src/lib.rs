//! # gwindows
//!
//! Random-access, windowed training examples from genomic annotation data.
//!
//! Two indexing engines are provided:
//!
//!  1. [`SparseIntervalIndexer`]: turns discrete annotations (BED, GFF/GTF features)
//!     into fixed-length windows with multi-hot label tensors, plus negative windows
//!     carved from the annotation-free parts of each chromosome.
//!
//!  2. [`ContinuousSignalIndexer`]: tiles every chromosome of a signal track with
//!     fixed-length windows and maps a flat global index to a genomic window through
//!     a cumulative index table, delegating signal extraction to a [`SignalExtractor`].
//!
//! Both expose the same pull-based [`WindowDataset`] interface: `len()` and
//! `get(&[usize])`. All state is immutable after construction, so batches can
//! be served from several threads.
//!
//! [`SparseIntervalIndexer`]: crate::sparse::SparseIntervalIndexer
//! [`ContinuousSignalIndexer`]: crate::continuous::ContinuousSignalIndexer
//! [`SignalExtractor`]: crate::traits::SignalExtractor
//! [`WindowDataset`]: crate::traits::WindowDataset

pub mod annotations;
pub mod commands;
pub mod continuous;
pub mod coordinates;
pub mod dataset;
pub mod error;
pub mod index;
pub mod io;
pub mod labels;
pub mod negatives;
pub mod ranges;
pub mod reporting;
pub mod sequences;
pub mod signal;
pub mod sparse;
pub mod test_utilities;
pub mod traits;
pub mod windows;

/// Genomic positions: 0-indexed, right-exclusive.
pub type Position = u32;

/// Signed positions used for window arithmetic before coordinates are validated.
pub type PositionOffset = i64;

/// Create an [`IndexMap`] of sequence names and their lengths.
///
/// ```
/// use gwindows::seqlens;
///
/// let sl = seqlens! { "chr1" => 100, "chr2" => 50 };
/// assert_eq!(sl.len(), 2);
/// ```
///
/// [`IndexMap`]: indexmap::IndexMap
#[macro_export]
macro_rules! seqlens {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = ::indexmap::IndexMap::<String, $crate::Position>::new();
        $(map.insert($key.to_string(), $value);)*
        map
    }};
}

pub mod prelude {
    pub use crate::annotations::{AnnotationTable, ChromNaming, Restriction};
    pub use crate::continuous::{ContinuousConfig, ContinuousSignalIndexer};
    pub use crate::coordinates::{ChromIndexEntry, CoordinateMapper, StridePolicy};
    pub use crate::dataset::{DatasetLabels, DatasetSource, IntervalDataset};
    pub use crate::error::GWindowsError;
    pub use crate::io::file::read_seqlens;
    pub use crate::labels::{LabelPolicy, LabelTensor, LabelTensorBuilder};
    pub use crate::negatives::{NegativeRatio, NegativeSampler, NegativeType};
    pub use crate::ranges::{Batch, DataOverflowWarning, Strand, Window};
    pub use crate::sequences::NucleotideSequences;
    pub use crate::signal::{BedGraphSignal, Downsampling, Normalization};
    pub use crate::sparse::{SeqLen, SparseConfig, SparseIntervalIndexer};
    pub use crate::traits::{GenericRange, SignalExtractor, WindowDataset};
    pub use crate::windows::{Augmentation, WindowCalculator, WindowPolicy};
    pub use crate::seqlens;
}
