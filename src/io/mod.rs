//! Types and methods for reading and parsing input and writing output.

pub mod file;
pub mod parsers;

pub use file::{read_seqlens, InputFile, OutputFile};
pub use parsers::{
    bed::BedAnnotationIterator, bedgraph::BedGraphIterator, detect::GenomicFile,
    gff::GffAnnotationIterator, AnnotationParser,
};
