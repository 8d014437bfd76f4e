//! Filetype detection functionality.
//!

use std::path::PathBuf;

use super::utils::get_base_extension;
use crate::error::GWindowsError;

/// Enum that indicates the filetype of some annotation or signal file.
#[derive(Debug, Clone, PartialEq)]
pub enum GenomicFile {
    /// Sparse annotation: BED with a name column (and optionally a strand column).
    Bed(PathBuf),
    /// Sparse annotation: GFF2/GFF3/GTF.
    Gff(PathBuf),
    /// Continuous signal: bedGraph.
    BedGraph(PathBuf),
}

impl GenomicFile {
    /// Detect the file type from its extension, ignoring compression extensions.
    ///
    /// Currently this supports `.bed`, `.gff`, `.gff3`, `.gtf`, and `.bedgraph`/`.bg`
    /// (case-insensitive). Anything else is [`GWindowsError::UnsupportedFileExtension`].
    pub fn detect(filepath: impl Into<PathBuf>) -> Result<Self, GWindowsError> {
        let filepath: PathBuf = filepath.into();
        let extension = get_base_extension(&filepath)
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| {
                GWindowsError::UnsupportedFileExtension(filepath.to_string_lossy().to_string())
            })?;

        match extension.as_str() {
            "bed" => Ok(GenomicFile::Bed(filepath)),
            "gff" | "gff3" | "gtf" => Ok(GenomicFile::Gff(filepath)),
            "bedgraph" | "bg" => Ok(GenomicFile::BedGraph(filepath)),
            _ => Err(GWindowsError::UnsupportedFileExtension(
                filepath.to_string_lossy().to_string(),
            )),
        }
    }

    /// Whether this file holds sparse (discrete) annotations.
    pub fn is_sparse(&self) -> bool {
        matches!(self, GenomicFile::Bed(_) | GenomicFile::Gff(_))
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            GenomicFile::Bed(path) | GenomicFile::Gff(path) | GenomicFile::BedGraph(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GenomicFile;
    use crate::error::GWindowsError;

    #[test]
    fn test_filetype_detect() {
        assert!(matches!(
            GenomicFile::detect("tests_data/peaks.bed").unwrap(),
            GenomicFile::Bed(_)
        ));
        assert!(matches!(
            GenomicFile::detect("genes.gtf.gz").unwrap(),
            GenomicFile::Gff(_)
        ));
        assert!(matches!(
            GenomicFile::detect("coverage.bedGraph").unwrap(),
            GenomicFile::BedGraph(_)
        ));
        assert!(GenomicFile::detect("genes.gff3").unwrap().is_sparse());
        assert!(!GenomicFile::detect("coverage.bg").unwrap().is_sparse());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = GenomicFile::detect("coverage.bw");
        assert!(matches!(
            result,
            Err(GWindowsError::UnsupportedFileExtension(_))
        ));
        assert!(result.unwrap_err().is_config_error());
        assert!(GenomicFile::detect("noextension").is_err());
    }
}
