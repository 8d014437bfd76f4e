//! In-memory bedGraph signal tracks.
//!
//! [`BedGraphSignal`] implements [`SignalExtractor`] over one or more bedGraph files
//! that share a genome file of sequence lengths. Bases not covered by a bedGraph
//! record have signal 0, and count as such in the genome-wide statistics used by
//! [`Normalization`].

use indexmap::IndexMap;
use ndarray::Array2;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{
    error::GWindowsError,
    io::{file::read_seqlens, parsers::bedgraph::BedGraphRecord, BedGraphIterator},
    ranges::try_range,
    traits::SignalExtractor,
    Position, PositionOffset,
};

/// How a window's signal is reduced to the target window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Downsampling {
    /// Average each block of `window / target_window` values.
    Mean,
    /// Take the first value of each block of `window / target_window` values.
    Subsample,
}

impl Downsampling {
    /// Parse a downsampling mode, where `"none"` is no downsampling.
    pub fn parse_option(s: &str) -> Result<Option<Self>, GWindowsError> {
        match s {
            "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for Downsampling {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Downsampling::Mean),
            "downsampling" | "subsample" => Ok(Downsampling::Subsample),
            _ => Err(GWindowsError::InvalidDownsampling(s.to_string())),
        }
    }
}

/// How per-base signal values are normalized before they are reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalization {
    /// `ln(1 + x)`.
    Log,
    /// Divide by the largest absolute value of the track.
    Max,
    /// Subtract the genome-wide mean of the track and divide by its standard deviation.
    ZScore,
}

impl Normalization {
    /// Parse a normalization mode, where `"none"` is no normalization.
    pub fn parse_option(s: &str) -> Result<Option<Self>, GWindowsError> {
        match s {
            "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }

    fn apply(self, values: &mut [f32], stats: &TrackStats) {
        match self {
            Normalization::Log => values.iter_mut().for_each(|v| *v = v.ln_1p()),
            Normalization::Max => {
                if stats.max_abs > 0.0 {
                    values.iter_mut().for_each(|v| *v /= stats.max_abs);
                }
            }
            Normalization::ZScore => {
                let scale = if stats.std > 0.0 { stats.std } else { 1.0 };
                values
                    .iter_mut()
                    .for_each(|v| *v = (*v - stats.mean) / scale);
            }
        }
    }
}

impl FromStr for Normalization {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(Normalization::Log),
            "max" => Ok(Normalization::Max),
            "zscore" | "z-score" => Ok(Normalization::ZScore),
            _ => Err(GWindowsError::InvalidChoice(s.to_string(), "normalization")),
        }
    }
}

/// Genome-wide statistics of a track, over every base of the genome.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct TrackStats {
    max_abs: f32,
    mean: f32,
    std: f32,
}

impl TrackStats {
    fn new(intervals: &IndexMap<String, Vec<SignalInterval>>, genome_size: f64) -> Self {
        let mut sum = 0.0f64;
        let mut sum_squares = 0.0f64;
        let mut max_abs = 0.0f32;
        for interval in intervals.values().flatten() {
            let width = (interval.end - interval.start) as f64;
            let value = interval.value as f64;
            sum += value * width;
            sum_squares += value * value * width;
            max_abs = max_abs.max(interval.value.abs());
        }
        if genome_size == 0.0 {
            return Self::default();
        }
        let mean = sum / genome_size;
        let variance = (sum_squares / genome_size - mean * mean).max(0.0);
        Self {
            max_abs,
            mean: mean as f32,
            std: variance.sqrt() as f32,
        }
    }
}

/// Check a window of `window` bases can be reduced to `target_window` values.
pub fn validate_target_window(
    window: Position,
    target_window: Position,
    downsampling: Option<Downsampling>,
) -> Result<(), GWindowsError> {
    if target_window == 0 || target_window > window {
        return Err(GWindowsError::InvalidWindow(format!(
            "the target window ({}) must be between 1 and the window length ({})",
            target_window, window
        )));
    }
    if downsampling.is_some() && window % target_window != 0 {
        return Err(GWindowsError::InvalidWindow(format!(
            "the target window ({}) must divide the window length ({}) when downsampling",
            target_window, window
        )));
    }
    Ok(())
}

/// A constant-valued run of signal `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SignalInterval {
    start: Position,
    end: Position,
    value: f32,
}

/// One or more signal tracks read from bedGraph files.
#[derive(Clone, Debug, Default)]
pub struct BedGraphSignal {
    seqlens: IndexMap<String, Position>,
    /// Per track, per sequence, intervals sorted by start.
    tracks: Vec<IndexMap<String, Vec<SignalInterval>>>,
    stats: Vec<TrackStats>,
}

impl BedGraphSignal {
    /// Build from sequence lengths and the records of each track.
    ///
    /// bedGraph records of a track are expected not to overlap.
    pub fn new(
        seqlens: IndexMap<String, Position>,
        tracks: Vec<Vec<BedGraphRecord>>,
    ) -> Result<Self, GWindowsError> {
        let genome_size: f64 = seqlens.values().map(|&length| length as f64).sum();
        let mut signal_tracks = Vec::with_capacity(tracks.len());
        let mut stats = Vec::with_capacity(tracks.len());
        for records in tracks {
            let mut track: IndexMap<String, Vec<SignalInterval>> = IndexMap::new();
            for record in records {
                let Some(&length) = seqlens.get(&record.seqname) else {
                    return Err(GWindowsError::MissingSequence(record.seqname));
                };
                try_range(record.start.into(), record.end.into(), length)?;
                track.entry(record.seqname).or_default().push(SignalInterval {
                    start: record.start,
                    end: record.end,
                    value: record.value,
                });
            }
            for intervals in track.values_mut() {
                intervals.sort_by_key(|interval| interval.start);
            }
            stats.push(TrackStats::new(&track, genome_size));
            signal_tracks.push(track);
        }
        Ok(Self {
            seqlens,
            tracks: signal_tracks,
            stats,
        })
    }

    /// Read a genome file and one bedGraph file per track.
    pub fn from_files(
        genome: impl Into<PathBuf>,
        filepaths: &[PathBuf],
    ) -> Result<Self, GWindowsError> {
        if filepaths.is_empty() {
            return Err(GWindowsError::NoInputFiles);
        }
        let seqlens = read_seqlens(genome)?;
        let mut tracks = Vec::with_capacity(filepaths.len());
        for filepath in filepaths {
            let records: Vec<BedGraphRecord> =
                BedGraphIterator::new(filepath)?.collect::<Result<_, _>>()?;
            log::debug!("read {} records from {}", records.len(), filepath.display());
            tracks.push(records);
        }
        Self::new(seqlens, tracks)
    }

    /// The per-base signal of one track over `[start, end)`.
    fn dense(&self, track: usize, seqname: &str, start: Position, end: Position) -> Vec<f32> {
        let mut values = vec![0.0; (end - start) as usize];
        let Some(intervals) = self.tracks[track].get(seqname) else {
            return values;
        };
        let first = intervals.partition_point(|interval| interval.end <= start);
        for interval in intervals[first..].iter().take_while(|i| i.start < end) {
            let from = interval.start.max(start) - start;
            let to = interval.end.min(end) - start;
            values[from as usize..to as usize].fill(interval.value);
        }
        values
    }
}

/// Reduce per-base values to `target_window` values.
fn reduce(values: &[f32], target_window: usize, downsampling: Option<Downsampling>) -> Vec<f32> {
    match downsampling {
        None => {
            let offset = (values.len() - target_window) / 2;
            values[offset..offset + target_window].to_vec()
        }
        Some(Downsampling::Mean) => values
            .chunks(values.len() / target_window)
            .map(|block| block.iter().sum::<f32>() / block.len() as f32)
            .collect(),
        Some(Downsampling::Subsample) => values
            .iter()
            .step_by(values.len() / target_window)
            .copied()
            .collect(),
    }
}

impl SignalExtractor for BedGraphSignal {
    fn seqlens(&self) -> IndexMap<String, Position> {
        self.seqlens.clone()
    }

    fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    fn extract(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        target_window: usize,
        downsampling: Option<Downsampling>,
        normalization: Option<Normalization>,
    ) -> Result<Array2<f32>, GWindowsError> {
        let length = *self
            .seqlens
            .get(seqname)
            .ok_or_else(|| GWindowsError::MissingSequence(seqname.to_string()))?;
        try_range(start as PositionOffset, end as PositionOffset, length)?;
        validate_target_window(end - start, target_window as Position, downsampling)?;

        let mut signal = Array2::zeros((target_window, self.num_tracks()));
        for track in 0..self.num_tracks() {
            let mut values = self.dense(track, seqname, start, end);
            if let Some(normalization) = normalization {
                normalization.apply(&mut values, &self.stats[track]);
            }
            let values = reduce(&values, target_window, downsampling);
            for (row, value) in values.into_iter().enumerate() {
                signal[[row, track]] = value;
            }
        }
        Ok(signal)
    }
}
