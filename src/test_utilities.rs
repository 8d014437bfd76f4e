//! Test cases and test utility functions.
//!

use indexmap::IndexMap;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::Write;
use tempfile::NamedTempFile;

use crate::ranges::{Feature, FeatureRecord, Strand};
use crate::Position;

// Random annotation defaults
//
// The tradeoff is catching stochastic errors vs test (and bench) time.
pub const NRANDOM_ANNOTATIONS: usize = 10000;

// annotation length
pub const MIN_LEN: Position = 1;
pub const MAX_LEN: Position = 500;

// number of chromosome sequences
pub const NCHROM: usize = 22;

// chromosome sizes
pub const MIN_CHROM_LEN: Position = 5_000_000;
pub const MAX_CHROM_LEN: Position = 25_000_000;

/// Write `contents` to a temporary file whose name ends in `name`, so that
/// extension-based file detection sees the extension of `name`.
pub fn temp_file_with(name: &str, contents: &str) -> NamedTempFile {
    let suffix = format!("_{}", name);
    let mut file = tempfile::Builder::new()
        .prefix("gwindows")
        .suffix(&suffix)
        .tempfile()
        .expect("could not create a temporary file");
    file.write_all(contents.as_bytes())
        .expect("could not write the temporary file");
    file.flush().expect("could not flush the temporary file");
    file
}

/// Build a [`FeatureRecord`].
pub fn feature(
    seqname: &str,
    start: Position,
    end: Position,
    name: &str,
    strand: Option<Strand>,
) -> FeatureRecord {
    FeatureRecord::new(seqname.to_string(), start, end, Feature::new(name, strand))
}

/// Build random sequence lengths for `NCHROM` chromosomes.
pub fn random_seqlens(rng: &mut StdRng) -> IndexMap<String, Position> {
    (1..=NCHROM)
        .map(|i| {
            (
                format!("chr{}", i),
                rng.gen_range(MIN_CHROM_LEN..=MAX_CHROM_LEN),
            )
        })
        .collect()
}

/// Build `n` random stranded annotations named after `names`, on the chromosomes
/// of `seqlens`. 0-indexed, right exclusive.
pub fn random_features(
    n: usize,
    seqlens: &IndexMap<String, Position>,
    names: &[&str],
    seed: u64,
) -> Vec<FeatureRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .filter_map(|_| {
            let (seqname, &chrom_len) = seqlens.get_index(rng.gen_range(0..seqlens.len()))?;
            let len = rng.gen_range(MIN_LEN..MAX_LEN);
            let start = rng.gen_range(0..chrom_len - len + 1);
            let name = names[rng.gen_range(0..names.len())];
            let strand = Strand::from_forward(rng.gen_bool(0.5));
            Some(feature(seqname, start, start + len, name, Some(strand)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_features_are_valid() {
        let mut rng = StdRng::seed_from_u64(1);
        let seqlens = random_seqlens(&mut rng);
        let features = random_features(1000, &seqlens, &["a", "b"], 2);
        assert_eq!(features.len(), 1000);
        for record in &features {
            assert!(record.validate().is_ok());
            assert!(record.end <= seqlens[&record.seqname]);
        }
        assert_eq!(features, random_features(1000, &seqlens, &["a", "b"], 2));
    }
}
