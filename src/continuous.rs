//! The [`ContinuousSignalIndexer`]: sliding windows over signal tracks.
//!
//! Every chromosome of the signal source is tiled with windows through a
//! [`CoordinateMapper`]. The label of a window is the signal of its target window,
//! extracted on demand from a [`SignalExtractor`].
//!
//! Labels have shape `(windows, target_window, tracks)`. When the tracks are grouped
//! into annotation types, listed file by file (`file1_type1, file1_type2, file2_type1,
//! ...`), the track axis is split into `(files, types)`.

use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn};

use crate::{
    annotations::ChromNaming,
    coordinates::{CoordinateMapper, StridePolicy},
    error::GWindowsError,
    ranges::{retain_representable, Batch, WindowCandidate},
    signal::{validate_target_window, Downsampling, Normalization},
    traits::{SignalExtractor, WindowDataset},
    Position,
};

/// Configuration of a [`ContinuousSignalIndexer`].
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousConfig {
    /// The window length.
    pub window: Position,
    /// The number of signal values per window.
    pub target_window: Position,
    pub downsampling: Option<Downsampling>,
    pub normalization: Option<Normalization>,
    /// The number of annotation types the tracks are grouped into.
    pub num_types: Option<usize>,
    pub stride: StridePolicy,
    pub chrom_naming: ChromNaming,
    /// Chromosomes to keep. Takes precedence over `exclude`.
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    /// Skip signal extraction.
    pub ignore_targets: bool,
}

impl ContinuousConfig {
    pub fn new(window: Position) -> Self {
        Self {
            window,
            target_window: 1,
            downsampling: None,
            normalization: None,
            num_types: None,
            stride: StridePolicy::Overlapping,
            chrom_naming: ChromNaming::default(),
            include: None,
            exclude: None,
            ignore_targets: false,
        }
    }
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Random-access windows over continuous signal, labelled with the signal itself.
#[derive(Debug)]
pub struct ContinuousSignalIndexer<S> {
    source: S,
    mapper: CoordinateMapper,
    /// Displayed chromosome names, aligned with the mapper entries.
    seqnames: Vec<String>,
    target_window: Position,
    downsampling: Option<Downsampling>,
    normalization: Option<Normalization>,
    /// The per-window label shape, `target_window` then the track axes.
    label_shape: Vec<usize>,
    ignore_targets: bool,
}

impl<S: SignalExtractor> ContinuousSignalIndexer<S> {
    pub fn new(source: S, config: &ContinuousConfig) -> Result<Self, GWindowsError> {
        validate_target_window(config.window, config.target_window, config.downsampling)?;

        let num_tracks = source.num_tracks();
        let mut label_shape = vec![config.target_window as usize];
        match config.num_types {
            None => label_shape.push(num_tracks),
            Some(types) if types > 0 && num_tracks % types == 0 => {
                label_shape.extend([num_tracks / types, types])
            }
            Some(types) => return Err(GWindowsError::InvalidTrackTypes(num_tracks, types)),
        }

        let seqlens: IndexMap<String, Position> = source
            .seqlens()
            .into_iter()
            .filter(|(seqname, _)| match (&config.include, &config.exclude) {
                (Some(include), _) => include.contains(seqname),
                (None, Some(exclude)) => !exclude.contains(seqname),
                (None, None) => true,
            })
            .collect();

        let stride = config.stride.stride(
            config.window,
            config.target_window,
            config.downsampling.is_some(),
        );
        let mapper = CoordinateMapper::new(&seqlens, config.window, stride)?;
        let seqnames = mapper
            .entries()
            .iter()
            .map(|entry| config.chrom_naming.normalize(&entry.seqname))
            .collect();
        log::debug!(
            "continuous index: {} windows of length {} (stride {}) on {} chromosomes",
            mapper.len(),
            config.window,
            stride,
            mapper.entries().len()
        );

        Ok(Self {
            source,
            mapper,
            seqnames,
            target_window: config.target_window,
            downsampling: config.downsampling,
            normalization: config.normalization,
            label_shape,
            ignore_targets: config.ignore_targets,
        })
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The window length.
    pub fn window(&self) -> Position {
        self.mapper.window()
    }

    /// The label shape of one window.
    pub fn label_shape(&self) -> &[usize] {
        &self.label_shape
    }
}

impl<S: SignalExtractor> WindowDataset for ContinuousSignalIndexer<S> {
    type Labels = ArrayD<f32>;

    fn len(&self) -> usize {
        self.mapper.len()
    }

    fn get(&self, indices: &[usize]) -> Result<Batch<ArrayD<f32>>, GWindowsError> {
        self.check_indices(indices)?;
        let len = self.len();

        let mut candidates = Vec::with_capacity(indices.len());
        let mut source_names = Vec::with_capacity(indices.len());
        for &index in indices {
            let (position, start, end) = self
                .mapper
                .locate(index)
                .ok_or(GWindowsError::IndexOutOfRange { index, len })?;
            candidates.push(WindowCandidate::new(&self.seqnames[position], start, end, None));
            source_names.push(self.mapper.entries()[position].seqname.as_str());
        }
        let retained = retain_representable(indices, &candidates);

        let labels = if self.ignore_targets {
            None
        } else {
            let mut shape = vec![retained.windows.len()];
            shape.extend_from_slice(&self.label_shape);
            let mut labels = ArrayD::zeros(IxDyn(&shape));
            for (i, (window, &position)) in retained
                .windows
                .iter()
                .zip(&retained.positions)
                .enumerate()
            {
                let signal = self.source.extract(
                    source_names[position],
                    window.start,
                    window.end,
                    self.target_window as usize,
                    self.downsampling,
                    self.normalization,
                )?;
                let signal = signal.into_shape(IxDyn(&self.label_shape))?;
                labels.index_axis_mut(Axis(0), i).assign(&signal);
            }
            Some(labels)
        };

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
    use crate::io::parsers::bedgraph::BedGraphRecord;
    use crate::seqlens;
    use crate::signal::BedGraphSignal;

    fn signal() -> BedGraphSignal {
        let tracks = vec![
            vec![BedGraphRecord {
                seqname: "1".to_string(),
                start: 0,
                end: 50,
                value: 1.0,
            }],
            vec![BedGraphRecord {
                seqname: "2".to_string(),
                start: 10,
                end: 20,
                value: 4.0,
            }],
        ];
        BedGraphSignal::new(seqlens! { "1" => 100, "2" => 40, "3" => 3 }, tracks).unwrap()
    }

    #[test]
    fn test_len_and_windows() {
        let indexer = ContinuousSignalIndexer::new(signal(), &ContinuousConfig::new(10)).unwrap();
        assert_eq!(indexer.len(), 91 + 31);
        let batch = indexer.get(&[0, 91]).unwrap();
        assert_eq!(batch.windows[0].seqname, "chr1");
        assert_eq!((batch.windows[0].start, batch.windows[0].end), (0, 10));
        assert_eq!(batch.windows[1].seqname, "chr2");

        let labels = batch.labels.unwrap();
        assert_eq!(labels.shape(), &[2, 1, 2]);
        assert_eq!(labels[[0, 0, 0]], 1.0);
        assert_eq!(labels[[1, 0, 1]], 0.0);
    }

    #[test]
    fn test_include_wins_over_exclude() {
        let config = ContinuousConfig {
            include: Some(vec!["2".to_string()]),
            exclude: Some(vec!["2".to_string()]),
            chrom_naming: ChromNaming::Numeric,
            ..ContinuousConfig::new(10)
        };
        let indexer = ContinuousSignalIndexer::new(signal(), &config).unwrap();
        assert_eq!(indexer.len(), 31);
        let batch = indexer.get(&[10]).unwrap();
        assert_eq!(batch.windows[0].seqname, "2");
        // window [10, 20), center base 14
        assert_eq!(batch.labels.unwrap()[[0, 0, 1]], 4.0);
    }

    #[test]
    fn test_non_overlapping_downsampled() {
        let config = ContinuousConfig {
            target_window: 5,
            downsampling: Some(Downsampling::Mean),
            stride: StridePolicy::NonOverlapping,
            exclude: Some(vec!["2".to_string()]),
            ..ContinuousConfig::new(20)
        };
        let indexer = ContinuousSignalIndexer::new(signal(), &config).unwrap();
        assert_eq!(indexer.mapper().stride(), 20);
        // windows at 0, 20, 40 and 60
        assert_eq!(indexer.len(), 4);
        let batch = indexer.get(&[2]).unwrap();
        assert_eq!((batch.windows[0].start, batch.windows[0].end), (40, 60));
        let labels = batch.labels.unwrap();
        assert_eq!(labels.shape(), &[1, 5, 2]);
        let track: Vec<f32> = labels.index_axis(Axis(2), 0).iter().copied().collect();
        assert_eq!(track, vec![1.0, 1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_grouped_and_normalized_tracks() {
        let config = ContinuousConfig {
            num_types: Some(2),
            normalization: Some(Normalization::Max),
            ..ContinuousConfig::new(10)
        };
        let indexer = ContinuousSignalIndexer::new(signal(), &config).unwrap();
        assert_eq!(indexer.label_shape(), &[1, 1, 2]);
        // window [10, 20) of "2", center base 14
        let batch = indexer.get(&[91 + 10]).unwrap();
        let labels = batch.labels.unwrap();
        assert_eq!(labels.shape(), &[1, 1, 1, 2]);
        assert_eq!(labels[[0, 0, 0, 0]], 0.0);
        assert_eq!(labels[[0, 0, 0, 1]], 1.0);

        let config = ContinuousConfig {
            num_types: Some(3),
            ..ContinuousConfig::new(10)
        };
        let result = ContinuousSignalIndexer::new(signal(), &config);
        assert!(matches!(result, Err(GWindowsError::InvalidTrackTypes(2, 3))));
        assert!(result.unwrap_err().is_config_error());
    }

    #[test]
    fn test_invalid_target_window() {
        let config = ContinuousConfig {
            target_window: 3,
            downsampling: Some(Downsampling::Subsample),
            ..ContinuousConfig::new(10)
        };
        let result = ContinuousSignalIndexer::new(signal(), &config);
        assert!(matches!(result, Err(GWindowsError::InvalidWindow(_))));

        let config = ContinuousConfig {
            target_window: 11,
            ..ContinuousConfig::new(10)
        };
        assert!(ContinuousSignalIndexer::new(signal(), &config).is_err());
    }

    #[test]
    fn test_ignore_targets_and_out_of_range() {
        let config = ContinuousConfig {
            ignore_targets: true,
            ..ContinuousConfig::new(10)
        };
        let indexer = ContinuousSignalIndexer::new(signal(), &config).unwrap();
        assert!(indexer.get(&[0, 1]).unwrap().labels.is_none());
        assert!(matches!(
            indexer.get(&[indexer.len()]),
            Err(GWindowsError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_round_trip_through_batches() {
        let indexer = ContinuousSignalIndexer::new(signal(), &ContinuousConfig::new(7)).unwrap();
        let indices: Vec<usize> = (0..indexer.len()).collect();
        let batch = indexer.get(&indices).unwrap();
        assert_eq!(batch.indices, indices);
        for (i, window) in batch.windows.iter().enumerate() {
            let source_name = window.seqname.trim_start_matches("chr");
            assert_eq!(
                indexer
                    .mapper()
                    .global_index(source_name, window.start as i64),
                Some(i)
            );
        }
    }
}
