//! [`IntervalDataset`]: one dataset type over both indexing engines.
//!
//! The kind of dataset is decided once, from the extensions of the input files, into
//! a [`DatasetSource`]. Annotation files (BED, GFF/GTF) give a sparse dataset and
//! bedGraph files a continuous one; the two cannot be mixed.

use ndarray::{concatenate, ArrayD, Axis};
use ndarray_npy::write_npy;
use std::path::{Path, PathBuf};

use crate::{
    continuous::{ContinuousConfig, ContinuousSignalIndexer},
    error::GWindowsError,
    io::GenomicFile,
    labels::LabelTensor,
    ranges::Batch,
    signal::BedGraphSignal,
    sparse::{SparseConfig, SparseIntervalIndexer},
    traits::WindowDataset,
    windows::WindowPolicy,
    Position,
};

/// The input files of a dataset, grouped by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum DatasetSource {
    Sparse(Vec<PathBuf>),
    Continuous(Vec<PathBuf>),
}

impl DatasetSource {
    /// Detect the kind of every file, failing if annotation and signal files are mixed.
    pub fn detect(filepaths: &[PathBuf]) -> Result<Self, GWindowsError> {
        let mut sparse = Vec::new();
        let mut continuous = Vec::new();
        for filepath in filepaths {
            let file = GenomicFile::detect(filepath)?;
            if file.is_sparse() {
                sparse.push(filepath.clone());
            } else {
                continuous.push(filepath.clone());
            }
        }
        match (sparse.is_empty(), continuous.is_empty()) {
            (true, true) => Err(GWindowsError::NoInputFiles),
            (false, true) => Ok(DatasetSource::Sparse(sparse)),
            (true, false) => Ok(DatasetSource::Continuous(continuous)),
            (false, false) => Err(GWindowsError::MixedDatasetSources),
        }
    }

    pub fn filepaths(&self) -> &[PathBuf] {
        match self {
            DatasetSource::Sparse(paths) | DatasetSource::Continuous(paths) => paths,
        }
    }
}

/// Labels of a batch from either engine.
#[derive(Clone, Debug, PartialEq)]
pub enum DatasetLabels {
    Sparse(LabelTensor),
    /// Shape `(windows, target_window, tracks)`, or
    /// `(windows, target_window, files, types)` for grouped tracks.
    Continuous(ArrayD<f32>),
}

impl DatasetLabels {
    /// The number of windows.
    pub fn len(&self) -> usize {
        match self {
            DatasetLabels::Sparse(tensor) => tensor.len(),
            DatasetLabels::Continuous(array) => array.len_of(Axis(0)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            DatasetLabels::Sparse(tensor) => tensor.shape(),
            DatasetLabels::Continuous(array) => array.shape(),
        }
    }

    /// The labels of the windows at `positions`, in that order.
    pub fn select(&self, positions: &[usize]) -> DatasetLabels {
        match self {
            DatasetLabels::Sparse(tensor) => DatasetLabels::Sparse(tensor.select(positions)),
            DatasetLabels::Continuous(array) => {
                DatasetLabels::Continuous(array.select(Axis(0), positions))
            }
        }
    }

    /// Stack the labels of several batches of the same dataset.
    pub fn concatenate(labels: Vec<DatasetLabels>) -> Result<Option<DatasetLabels>, GWindowsError> {
        let mut sparse = Vec::new();
        let mut continuous = Vec::new();
        for batch_labels in labels {
            match batch_labels {
                DatasetLabels::Sparse(tensor) => sparse.push(tensor),
                DatasetLabels::Continuous(array) => continuous.push(array),
            }
        }
        match (sparse.is_empty(), continuous.is_empty()) {
            (true, true) => Ok(None),
            (false, true) => Ok(LabelTensor::concatenate(&sparse)?.map(DatasetLabels::Sparse)),
            (true, false) => {
                let views: Vec<_> = continuous.iter().map(|a| a.view()).collect();
                Ok(Some(DatasetLabels::Continuous(concatenate(Axis(0), &views)?)))
            }
            (false, false) => Err(GWindowsError::MixedDatasetSources),
        }
    }

    /// Write the labels as a `.npy` file: `u8` for sparse labels, `f32` for signal.
    pub fn write_npy(&self, path: impl AsRef<Path>) -> Result<(), GWindowsError> {
        match self {
            DatasetLabels::Sparse(LabelTensor::PerWindow(array)) => write_npy(path, array)?,
            DatasetLabels::Sparse(LabelTensor::PerBase(array)) => write_npy(path, array)?,
            DatasetLabels::Continuous(array) => write_npy(path, array)?,
        }
        Ok(())
    }
}

/// A sparse or continuous dataset behind one [`WindowDataset`] interface.
#[derive(Debug)]
pub enum IntervalDataset {
    Sparse(SparseIntervalIndexer),
    Continuous(ContinuousSignalIndexer<BedGraphSignal>),
}

impl IntervalDataset {
    /// Build the dataset for `source`. Continuous datasets need a genome file.
    pub fn new(
        source: &DatasetSource,
        genome: Option<&Path>,
        sparse: &SparseConfig,
        continuous: &ContinuousConfig,
    ) -> Result<Self, GWindowsError> {
        match source {
            DatasetSource::Sparse(filepaths) => Ok(IntervalDataset::Sparse(
                SparseIntervalIndexer::from_files(filepaths, sparse)?,
            )),
            DatasetSource::Continuous(filepaths) => {
                let genome = genome.ok_or(GWindowsError::MissingGenomeFile)?;
                let signal = BedGraphSignal::from_files(genome, filepaths)?;
                Ok(IntervalDataset::Continuous(ContinuousSignalIndexer::new(
                    signal, continuous,
                )?))
            }
        }
    }

    /// Detect the kind of the input files and build the dataset.
    pub fn open(
        filepaths: &[PathBuf],
        genome: Option<&Path>,
        sparse: &SparseConfig,
        continuous: &ContinuousConfig,
    ) -> Result<Self, GWindowsError> {
        let source = DatasetSource::detect(filepaths)?;
        Self::new(&source, genome, sparse, continuous)
    }

    /// The window length.
    pub fn length(&self) -> Position {
        match self {
            IntervalDataset::Sparse(indexer) => indexer.length(),
            IntervalDataset::Continuous(indexer) => indexer.window(),
        }
    }

    /// Whether windows keep the annotation span rather than a fixed length.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, IntervalDataset::Sparse(indexer) if indexer.policy() == WindowPolicy::Passthrough)
    }
}

impl WindowDataset for IntervalDataset {
    type Labels = DatasetLabels;

    fn len(&self) -> usize {
        match self {
            IntervalDataset::Sparse(indexer) => indexer.len(),
            IntervalDataset::Continuous(indexer) => indexer.len(),
        }
    }

    fn get(&self, indices: &[usize]) -> Result<Batch<DatasetLabels>, GWindowsError> {
        match self {
            IntervalDataset::Sparse(indexer) => {
                Ok(indexer.get(indices)?.map_labels(DatasetLabels::Sparse))
            }
            IntervalDataset::Continuous(indexer) => {
                Ok(indexer.get(indices)?.map_labels(DatasetLabels::Continuous))
            }
        }
    }
}
