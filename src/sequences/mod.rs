//! Nucleotide sequences for dataset windows.
//!
//! [`NucleotideSequences`] holds a FASTA file in memory. Besides plain window
//! extraction, it covers the two cases a windowed dataset needs: random sequence for
//! zero-length placeholder windows and `N` padding for windows shorter than the
//! dataset length.
//!
//! [`NucleotideSequences`]: nucleotide::NucleotideSequences

pub mod nucleotide;

pub use nucleotide::{random_bases, NucleotideSequences, Nucleotides};
