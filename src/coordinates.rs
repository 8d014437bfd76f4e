//! The [`CoordinateMapper`]: a flat global index over sliding windows of every
//! chromosome.
//!
//! Each chromosome contributes a contiguous, gapless block of global indices. A
//! global index is resolved by binary search over the blocks, so lookups are
//! `O(log n)` in the number of chromosomes.

use indexmap::IndexMap;

use crate::{error::GWindowsError, Position, PositionOffset};

/// Whether consecutive windows overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StridePolicy {
    /// Slide by one base.
    #[default]
    Overlapping,
    /// Slide so targets do not overlap: by the target window, or by the whole
    /// window when the target is downsampled from it.
    NonOverlapping,
}

impl StridePolicy {
    /// The stride between consecutive windows.
    pub fn stride(&self, window: Position, target_window: Position, downsampled: bool) -> Position {
        match (self, downsampled) {
            (StridePolicy::Overlapping, _) => 1,
            (StridePolicy::NonOverlapping, false) => target_window,
            (StridePolicy::NonOverlapping, true) => window,
        }
    }
}

/// One chromosome's block of global indices.
///
/// `span_start` and `span_stop` bound the window centers;
/// `[first_global_index, last_global_index)` are the global indices of its windows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChromIndexEntry {
    pub seqname: String,
    pub span_start: PositionOffset,
    pub span_stop: PositionOffset,
    pub first_global_index: usize,
    pub last_global_index: usize,
}

impl ChromIndexEntry {
    /// The number of windows on this chromosome.
    pub fn len(&self) -> usize {
        self.last_global_index - self.first_global_index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maps global indices to windows `(chromosome, start, stop)` and back.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateMapper {
    entries: Vec<ChromIndexEntry>,
    window: Position,
    stride: Position,
}

impl CoordinateMapper {
    /// Build the index table from chromosome lengths, skipping chromosomes too short
    /// for a single window.
    pub fn new(
        seqlens: &IndexMap<String, Position>,
        window: Position,
        stride: Position,
    ) -> Result<Self, GWindowsError> {
        if window == 0 || stride == 0 {
            return Err(GWindowsError::InvalidWindow(format!(
                "window ({}) and stride ({}) must be positive",
                window, stride
            )));
        }
        let half_window = (window / 2) as PositionOffset;
        let odd = (window % 2) as PositionOffset;

        let mut entries = Vec::with_capacity(seqlens.len());
        let mut first_global_index = 0;
        for (seqname, &length) in seqlens {
            let span_start = half_window;
            let span_stop = length as PositionOffset - half_window + 1 - odd;
            let count = (span_stop - span_start).div_euclid(stride as PositionOffset);
            if count <= 0 {
                log::debug!(
                    "skipping {} (length {}): shorter than the window length {}",
                    seqname,
                    length,
                    window
                );
                continue;
            }
            let last_global_index = first_global_index + count as usize;
            entries.push(ChromIndexEntry {
                seqname: seqname.clone(),
                span_start,
                span_stop,
                first_global_index,
                last_global_index,
            });
            first_global_index = last_global_index;
        }
        Ok(Self {
            entries,
            window,
            stride,
        })
    }

    /// The total number of windows.
    pub fn len(&self) -> usize {
        self.entries.last().map_or(0, |e| e.last_global_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> &[ChromIndexEntry] {
        &self.entries
    }

    pub fn window(&self) -> Position {
        self.window
    }

    pub fn stride(&self) -> Position {
        self.stride
    }

    /// Resolve a global index into the position of its chromosome entry and its
    /// window `[start, stop)`.
    pub fn locate(&self, index: usize) -> Option<(usize, PositionOffset, PositionOffset)> {
        if index >= self.len() {
            return None;
        }
        let position = self
            .entries
            .partition_point(|e| e.last_global_index <= index);
        let entry = self.entries.get(position)?;
        let offset = (index - entry.first_global_index) as PositionOffset;
        let start = entry.span_start + offset * self.stride as PositionOffset
            - (self.window / 2) as PositionOffset;
        Some((position, start, start + self.window as PositionOffset))
    }

    /// The global index of the window starting at `start` on `seqname`, if there is one.
    pub fn global_index(&self, seqname: &str, start: PositionOffset) -> Option<usize> {
        let entry = self.entries.iter().find(|e| e.seqname == seqname)?;
        let offset = start + (self.window / 2) as PositionOffset - entry.span_start;
        let stride = self.stride as PositionOffset;
        if offset < 0 || offset % stride != 0 {
            return None;
        }
        let k = (offset / stride) as usize;
        (k < entry.len()).then(|| entry.first_global_index + k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seqlens;

    #[test]
    fn test_entries() {
        let sl = seqlens! { "chr1" => 100, "chr2" => 4, "chr3" => 55 };
        let mapper = CoordinateMapper::new(&sl, 10, 1).unwrap();
        // chr2 is shorter than the window
        assert_eq!(mapper.entries().len(), 2);
        let chr1 = &mapper.entries()[0];
        assert_eq!((chr1.span_start, chr1.span_stop), (5, 96));
        assert_eq!(chr1.len(), 91);
        let chr3 = &mapper.entries()[1];
        assert_eq!(chr3.first_global_index, 91);
        assert_eq!(mapper.len(), 91 + 46);
    }

    #[test]
    fn test_locate() {
        let sl = seqlens! { "chr1" => 100, "chr2" => 50 };
        let mapper = CoordinateMapper::new(&sl, 10, 1).unwrap();
        assert_eq!(mapper.locate(0), Some((0, 0, 10)));
        assert_eq!(mapper.locate(90), Some((0, 90, 100)));
        let (position, start, _) = mapper.locate(91).unwrap();
        assert_eq!((mapper.entries()[position].seqname.as_str(), start), ("chr2", 0));
        assert!(mapper.locate(mapper.len()).is_none());
    }

    #[test]
    fn test_odd_window_and_stride() {
        let sl = seqlens! { "chr1" => 100 };
        let mapper = CoordinateMapper::new(&sl, 11, 5).unwrap();
        // windows start at 0, 5, ..., 85: the last one ends at 96
        assert_eq!(mapper.len(), 18);
        let (_, start, stop) = mapper.locate(17).unwrap();
        assert_eq!((start, stop), (85, 96));
    }

    #[test]
    fn test_round_trip() {
        let sl = seqlens! { "chr1" => 1000, "chr2" => 333, "chr3" => 7, "chrM" => 64 };
        for (window, stride) in [(10, 1), (11, 3), (64, 64), (5, 2)] {
            let mapper = CoordinateMapper::new(&sl, window, stride).unwrap();
            for i in 0..mapper.len() {
                let (position, start, stop) = mapper.locate(i).unwrap();
                let entry = &mapper.entries()[position];
                assert!(start >= 0);
                assert!(stop <= sl[&entry.seqname] as PositionOffset);
                assert_eq!(mapper.global_index(&entry.seqname, start), Some(i));
            }
        }
    }

    #[test]
    fn test_global_index_off_grid() {
        let sl = seqlens! { "chr1" => 100 };
        let mapper = CoordinateMapper::new(&sl, 10, 4).unwrap();
        assert_eq!(mapper.global_index("chr1", 4), Some(1));
        assert_eq!(mapper.global_index("chr1", 3), None);
        assert_eq!(mapper.global_index("chr9", 0), None);
    }

    #[test]
    fn test_stride_policy() {
        assert_eq!(StridePolicy::Overlapping.stride(100, 10, true), 1);
        assert_eq!(StridePolicy::NonOverlapping.stride(100, 10, false), 10);
        assert_eq!(StridePolicy::NonOverlapping.stride(100, 10, true), 100);
        assert!(CoordinateMapper::new(&seqlens! { "chr1" => 10 }, 0, 1).is_err());
    }
}
