//! The [`GWindowsError`] `enum` definition and error messages.
//!
use crate::{Position, PositionOffset};
use genomap::GenomeMapError;
use std::num::{ParseFloatError, ParseIntError};
use std::string::FromUtf8Error;
use thiserror::Error;

/// The [`GWindowsError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum GWindowsError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not write .npy file: {0}")]
    NpyWriteError(#[from] ndarray_npy::WriteNpyError),
    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    // File parsing related errors
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("Float parsing error: {0}")]
    ParseFloatError(#[from] ParseFloatError),
    #[error("UTF-8 decoding error: {0}")]
    FromUtf8Error(#[from] FromUtf8Error),
    #[error("Column has invalid type: expected {expected_type}, found '{found_value}'.\nLine: {line}")]
    InvalidColumnType {
        expected_type: String,
        found_value: String,
        line: String,
    },
    #[error("BED annotation file needs at least four columns (sequence name, start, end, name).\nLine: {0}")]
    BedlikeTooFewColumns(String),
    #[error("GFF/GTF line must have nine tab-separated columns.\nLine: {0}")]
    GffTooFewColumns(String),
    #[error("Invalid strand '{0}': must be either '+', '-', or '.'")]
    InvalidStrand(String),
    #[error("Genome file is invalid: {0}")]
    InvalidGenomeFile(String),
    #[error("Error encountered in genomap::GenomeMap")]
    GenomeMapError(#[from] GenomeMapError),

    // Invalid genomic range errors
    #[error("Range invalid: start ({0}) must be less than end ({1})")]
    InvalidGenomicRange(Position, Position),
    #[error("Range [{0}, {1}) is invalid for sequence of length {2}")]
    InvalidGenomicRangeForSequence(PositionOffset, PositionOffset, Position),
    #[error("Sequence name '{0}' is not in the sequence container")]
    MissingSequence(String),

    // Configuration errors
    #[error("Passthrough ('real') windows cannot be combined with data augmentation")]
    AugmentationWithPassthrough,
    #[error("Annotation {0}:{1}-{2} is longer than the window length {3}")]
    AnnotationExceedsWindow(String, Position, Position, Position),
    #[error("Restricting annotations to their start or stop requires every annotation to have a strand")]
    RestrictionRequiresStrand,
    #[error("Invalid negative ratio '{0}': must be 'all' or an integer")]
    InvalidNegativeRatio(String),
    #[error("Invalid negative type '{0}': must be 'real', 'random', or 'none'")]
    InvalidNegativeType(String),
    #[error("Random negative windows require an integer negative ratio, not 'all'")]
    RandomNegativesRequireCount,
    #[error("Invalid downsampling mode '{0}': must be 'none', 'mean', or 'downsampling'")]
    InvalidDownsampling(String),
    #[error("{0} signal tracks cannot be grouped into {1} types")]
    InvalidTrackTypes(usize, usize),
    #[error("Invalid window configuration: {0}")]
    InvalidWindow(String),
    #[error("Invalid configuration value '{0}' for {1}")]
    InvalidChoice(String, &'static str),
    #[error("Unsupported file extension for '{0}'")]
    UnsupportedFileExtension(String),
    #[error("Annotation and signal files cannot be mixed in one dataset")]
    MixedDatasetSources,
    #[error("No input files were given")]
    NoInputFiles,
    #[error("Signal files require a genome file of sequence lengths")]
    MissingGenomeFile,
    #[error("No annotations are left after filtering by the annotation list")]
    NoAnnotations,

    // Dataset access errors
    #[error("Index {index} is out of range for a dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    // Command line tool related errors
    #[error("Command line argument error: {0}")]
    ArgumentError(#[from] clap::error::Error),
}

impl GWindowsError {
    /// Whether this error comes from an invalid or contradictory configuration,
    /// as opposed to I/O, parsing, or out-of-range access.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            GWindowsError::AugmentationWithPassthrough
                | GWindowsError::AnnotationExceedsWindow(..)
                | GWindowsError::RestrictionRequiresStrand
                | GWindowsError::InvalidNegativeRatio(_)
                | GWindowsError::InvalidNegativeType(_)
                | GWindowsError::RandomNegativesRequireCount
                | GWindowsError::InvalidDownsampling(_)
                | GWindowsError::InvalidTrackTypes(..)
                | GWindowsError::InvalidWindow(_)
                | GWindowsError::InvalidChoice(..)
                | GWindowsError::UnsupportedFileExtension(_)
                | GWindowsError::MixedDatasetSources
                | GWindowsError::NoInputFiles
                | GWindowsError::MissingGenomeFile
                | GWindowsError::NoAnnotations
        )
    }
}
