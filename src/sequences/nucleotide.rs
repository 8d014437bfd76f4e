//! Types and methods for extracting the nucleotide sequence of windows.
//!
//! Currently this requires the [`noodles::fasta`] module, but their API is unstable
//! and may be a source of future pain.

use bytes::Bytes;
use genomap::GenomeMap;
use indexmap::IndexMap;
use noodles::fasta::reader;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::str;

use crate::error::GWindowsError;
use crate::ranges::{try_range, Window};
use crate::{Position, PositionOffset};

const BASES: &[u8; 4] = b"ACGT";

/// A newtype around raw nucleotide [`Bytes`], for making it more
/// display and other operations more convenient.
#[derive(Clone, Debug, PartialEq)]
pub struct Nucleotides(Bytes);

impl fmt::Display for Nucleotides {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match str::from_utf8(&self.0) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl Deref for Nucleotides {
    type Target = Bytes;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for Nucleotides {
    fn from(bases: Vec<u8>) -> Self {
        Nucleotides(Bytes::from(bases))
    }
}

impl<'a> From<&'a str> for Nucleotides {
    fn from(s: &'a str) -> Self {
        Nucleotides(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl Nucleotides {
    /// Get the length of the nucleotide sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether this is an empty object.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_uppercase(&self) -> Nucleotides {
        Nucleotides::from(self.0.to_ascii_uppercase())
    }

    /// Pad with `fill` on both sides to `length`, the extra base of an odd pad going
    /// to the left as in centered windows. Longer sequences are trimmed around their
    /// center.
    pub fn pad_center(&self, length: usize, fill: u8) -> Nucleotides {
        if self.len() >= length {
            let left = (self.len() - length) / 2;
            return Nucleotides(self.0.slice(left..left + length));
        }
        let pad = length - self.len();
        let left = pad - pad / 2;
        let mut padded = Vec::with_capacity(length);
        padded.resize(left, fill);
        padded.extend_from_slice(&self.0);
        padded.resize(length, fill);
        Nucleotides::from(padded)
    }
}

/// Draw `length` uniformly random bases from `ACGT`.
pub fn random_bases<R: Rng>(rng: &mut R, length: usize) -> Nucleotides {
    let bases: Vec<u8> = (0..length).map(|_| BASES[rng.gen_range(0..4)]).collect();
    Nucleotides::from(bases)
}

/// [`NucleotideSequences`] for storing a whole genome's nucleotide sequence
/// data in-memory.
pub struct NucleotideSequences {
    data: GenomeMap<Nucleotides>,
}

impl fmt::Debug for NucleotideSequences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NucleotideSequences")
            .field("seqlens", &self.seqlens())
            .finish()
    }
}

impl NucleotideSequences {
    /// Load an entire FASTA file into memory, into a [`NucleotideSequences`] object.
    ///
    /// # Arguments
    /// * `filepath`: a path to the (possible gzipped) FASTA file.
    /// * `seqnames`: an optional subset of sequences to load.
    pub fn from_fasta(
        filepath: impl Into<PathBuf>,
        seqnames: Option<Vec<String>>,
    ) -> Result<Self, GWindowsError> {
        let data = parse_fasta(filepath, seqnames)?;
        Ok(Self { data })
    }

    /// Retrieve an [`IndexMap`] of the sequence names and their lengths.
    pub fn seqlens(&self) -> IndexMap<String, Position> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), Position::try_from(v.len()).unwrap_or(Position::MAX)))
            .collect()
    }

    /// Retrieve the [`Nucleotides`] for a particular sequence name.
    pub fn get_sequence(&self, seqname: &str) -> Result<&Nucleotides, GWindowsError> {
        self.data
            .get(seqname)
            .ok_or(GWindowsError::MissingSequence(seqname.to_string()))
    }

    /// Extract the bases of a window.
    pub fn extract(&self, window: &Window) -> Result<Nucleotides, GWindowsError> {
        let sequence = self.get_sequence(&window.seqname)?;
        let length = Position::try_from(sequence.len()).unwrap_or(Position::MAX);
        let range = try_range(
            window.start as PositionOffset,
            window.end as PositionOffset,
            length,
        )?;
        Ok(Nucleotides(sequence.0.slice(range)))
    }

    /// The sequence of a dataset window.
    ///
    /// Zero-length placeholder windows give `length` random bases. When `pad` is set,
    /// shorter sequences are center-padded with `N` to `length`.
    pub fn window_sequence<R: Rng>(
        &self,
        window: &Window,
        length: usize,
        pad: bool,
        rng: &mut R,
    ) -> Result<Nucleotides, GWindowsError> {
        if window.is_placeholder() {
            return Ok(random_bases(rng, length));
        }
        let bases = self.extract(window)?;
        if pad && bases.len() != length {
            Ok(bases.pad_center(length, b'N'))
        } else {
            Ok(bases)
        }
    }
}

/// Parse a FASTA file into a [`GenomeMap<Nucleotides>`].
pub fn parse_fasta(
    filepath: impl Into<PathBuf>,
    seqnames: Option<Vec<String>>,
) -> Result<GenomeMap<Nucleotides>, GWindowsError> {
    let seqnames_set: Option<HashSet<String>> = seqnames.map(|names| names.into_iter().collect());

    let filepath = filepath.into();

    let mut reader = reader::Builder.build_from_path(filepath)?;

    let mut sequences = GenomeMap::new();

    for result in reader.records() {
        let record = result?;
        let name = String::from_utf8(record.definition().name().to_vec())?;
        if seqnames_set
            .as_ref()
            .map_or(true, |keep_seqnames| keep_seqnames.contains(&name))
        {
            let seq = Bytes::from(record.sequence().as_ref().to_vec());
            sequences.insert(&name, Nucleotides(seq))?;
        }
    }

    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::temp_file_with;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sequences() -> (tempfile::NamedTempFile, NucleotideSequences) {
        let file = temp_file_with("genome.fa", ">chr1\nACGTACGTAA\nCCGG\n>chr2\nttttgggg\n");
        let sequences = NucleotideSequences::from_fasta(file.path(), None).unwrap();
        (file, sequences)
    }

    #[test]
    fn test_from_fasta() {
        let (_file, sequences) = sequences();
        let seqlens = sequences.seqlens();
        assert_eq!(seqlens.get("chr1"), Some(&14));
        assert_eq!(seqlens.get("chr2"), Some(&8));
    }

    #[test]
    fn test_extract() {
        let (_file, sequences) = sequences();
        let bases = sequences.extract(&Window::new("chr1", 8, 12)).unwrap();
        assert_eq!(bases.to_string(), "AACC");
        let bases = sequences.extract(&Window::new("chr2", 0, 3)).unwrap();
        assert_eq!(bases.to_uppercase().to_string(), "TTT");
        assert!(matches!(
            sequences.extract(&Window::new("chr3", 0, 3)),
            Err(GWindowsError::MissingSequence(_))
        ));
        assert!(sequences.extract(&Window::new("chr2", 4, 9)).is_err());
    }

    #[test]
    fn test_pad_center() {
        let bases = Nucleotides::from("ACG");
        assert_eq!(bases.pad_center(6, b'N').to_string(), "NNACGN");
        assert_eq!(bases.pad_center(5, b'N').to_string(), "NACGN");
        assert_eq!(bases.pad_center(3, b'N').to_string(), "ACG");
        assert_eq!(Nucleotides::from("AACCGG").pad_center(2, b'N').to_string(), "CC");
    }

    #[test]
    fn test_window_sequence() {
        let (_file, sequences) = sequences();
        let mut rng = StdRng::seed_from_u64(0);
        let random = sequences
            .window_sequence(&Window::new("chr1", 0, 0), 12, false, &mut rng)
            .unwrap();
        assert_eq!(random.len(), 12);
        assert!(random.iter().all(|b| BASES.contains(b)));

        let padded = sequences
            .window_sequence(&Window::new("chr1", 0, 4), 7, true, &mut rng)
            .unwrap();
        assert_eq!(padded.to_string(), "NNACGTN");
    }
}
