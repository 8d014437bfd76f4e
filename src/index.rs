//! Flat row addressing over buckets of varying size.
//!
//! Many row spaces in this crate are a concatenation of buckets: one bucket of
//! windows per annotation, one bucket of negative window starts per gap. A
//! [`CumulativeIndex`] stores only the cumulative bucket sizes, so a row space whose
//! size is proportional to genome length costs memory proportional to the number of
//! buckets, and a global row is resolved by binary search.

/// Cumulative (exclusive) ends of consecutive buckets of rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CumulativeIndex {
    ends: Vec<usize>,
}

impl CumulativeIndex {
    /// Build the index in one pass over the bucket sizes.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let counts = counts.into_iter();
        let mut ends = Vec::with_capacity(counts.size_hint().0);
        let mut total = 0;
        for count in counts {
            total += count;
            ends.push(total);
        }
        Self { ends }
    }

    /// The total number of rows.
    pub fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of buckets (including empty ones).
    pub fn num_buckets(&self) -> usize {
        self.ends.len()
    }

    /// The first row of a bucket.
    pub fn bucket_start(&self, bucket: usize) -> usize {
        if bucket == 0 {
            0
        } else {
            self.ends[bucket - 1]
        }
    }

    /// Resolve a global row into `(bucket, offset within bucket)`, or `None` if the
    /// row is out of range. Empty buckets are never returned.
    pub fn locate(&self, row: usize) -> Option<(usize, usize)> {
        if row >= self.len() {
            return None;
        }
        let bucket = self.ends.partition_point(|&end| end <= row);
        Some((bucket, row - self.bucket_start(bucket)))
    }
}
