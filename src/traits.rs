//! Traits used by the gwindows library.
//!

use indexmap::IndexMap;
use ndarray::Array2;

use crate::{
    error::GWindowsError,
    ranges::Batch,
    signal::{Downsampling, Normalization},
    Position,
};

/// The [`GenericRange`] trait defines common functionality for all range types.
pub trait GenericRange: Clone {
    fn start(&self) -> Position;
    fn end(&self) -> Position;
    fn width(&self) -> Position {
        self.end() - self.start()
    }
}

/// The pull-based, index-addressed dataset interface shared by both indexing engines.
///
/// Implementations are immutable after construction: `get` is a pure function of the
/// requested indices, so disjoint batches can be requested from several threads.
pub trait WindowDataset {
    /// The label container type for a batch of windows.
    type Labels;

    /// The number of addressable rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize the windows and labels for the rows at `indices`.
    ///
    /// Fails with [`GWindowsError::IndexOutOfRange`] if any index is `>= len()`.
    fn get(&self, indices: &[usize]) -> Result<Batch<Self::Labels>, GWindowsError>;

    /// Check every index is within `[0, len())`.
    fn check_indices(&self, indices: &[usize]) -> Result<(), GWindowsError> {
        let len = self.len();
        match indices.iter().find(|&&index| index >= len) {
            Some(&index) => Err(GWindowsError::IndexOutOfRange { index, len }),
            None => Ok(()),
        }
    }
}

/// A source of continuous per-basepair signal (e.g. coverage tracks).
pub trait SignalExtractor {
    /// The names and lengths of the sequences this source covers.
    fn seqlens(&self) -> IndexMap<String, Position>;

    /// The number of signal tracks; the second axis of extracted arrays.
    fn num_tracks(&self) -> usize;

    /// Extract the signal of `[start, end)` on `seqname`, normalized and then reduced
    /// to `target_window` rows, as an array of shape `(target_window, num_tracks)`.
    fn extract(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        target_window: usize,
        downsampling: Option<Downsampling>,
        normalization: Option<Normalization>,
    ) -> Result<Array2<f32>, GWindowsError>;
}
