//! The [`AnnotationTable`], a normalized, chromosome-partitioned table of annotations.
//!
//! A table is built once from one or more annotation files and then passed through a
//! fixed sequence of consuming transforms (restriction, chromosome naming, chromosome
//! filtering), each returning a new table.

use indexmap::IndexMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{
    error::GWindowsError,
    io::parsers::AnnotationParser,
    ranges::{coitrees::AnnotationTree, Annotation, FeatureRecord, Strand},
    traits::GenericRange,
    Position,
};

/// How chromosome names are written in the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChromNaming {
    /// UCSC-style names, e.g. `chr1`.
    #[default]
    Ucsc,
    /// Ensembl-style names, e.g. `1`.
    Numeric,
}

impl ChromNaming {
    /// Add or strip the `chr` prefix of a sequence name.
    pub fn normalize(&self, seqname: &str) -> String {
        match self {
            ChromNaming::Ucsc => {
                if seqname.starts_with("chr") {
                    seqname.to_string()
                } else {
                    format!("chr{}", seqname)
                }
            }
            ChromNaming::Numeric => seqname
                .strip_prefix("chr")
                .unwrap_or(seqname)
                .to_string(),
        }
    }
}

impl FromStr for ChromNaming {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ucsc" | "chr" => Ok(ChromNaming::Ucsc),
            "numeric" | "ensembl" => Ok(ChromNaming::Numeric),
            _ => Err(GWindowsError::InvalidChoice(s.to_string(), "chromosome naming")),
        }
    }
}

/// Which part of each annotation is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Restriction {
    /// The whole annotation.
    #[default]
    All,
    /// Only the first base on the annotation's strand.
    Start,
    /// Only the last base on the annotation's strand.
    Stop,
}

impl FromStr for Restriction {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Restriction::All),
            "start" => Ok(Restriction::Start),
            "stop" => Ok(Restriction::Stop),
            _ => Err(GWindowsError::InvalidChoice(s.to_string(), "restriction")),
        }
    }
}

/// Annotations partitioned by chromosome, in order of first appearance.
///
/// `num_sources` is the number of annotation files and `num_labels` the number of
/// configured categories; these fix the last two axes of label tensors, even when a
/// file or category has no annotation left.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationTable {
    chroms: IndexMap<String, Vec<Annotation>>,
    num_sources: usize,
    num_labels: usize,
}

impl AnnotationTable {
    /// Create an empty table with fixed source and label dimensions.
    pub fn new(num_sources: usize, num_labels: usize) -> Self {
        Self {
            chroms: IndexMap::new(),
            num_sources,
            num_labels,
        }
    }

    /// Merge the records of several annotation sources, keeping only features whose
    /// name is in `annotation_list`.
    ///
    /// Each annotation's `source` is its file's position plus one, and its `label`
    /// the position of its name in `annotation_list` plus one.
    pub fn from_sources(
        sources: Vec<Vec<FeatureRecord>>,
        annotation_list: &[String],
    ) -> Result<Self, GWindowsError> {
        let label_ids: IndexMap<&str, usize> = annotation_list
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i + 1))
            .collect();

        let mut table = AnnotationTable::new(sources.len(), annotation_list.len());
        let mut num_dropped = 0;
        for (i, records) in sources.into_iter().enumerate() {
            for record in records {
                let Some(&label) = label_ids.get(record.data.name.as_str()) else {
                    num_dropped += 1;
                    continue;
                };
                let annotation =
                    Annotation::new(record.start, record.end, record.data.strand, label, i + 1);
                table.push(record.seqname, annotation);
            }
        }
        log::debug!(
            "kept {} annotations, dropped {} not in the annotation list",
            table.len(),
            num_dropped
        );
        Ok(table)
    }

    /// Read and merge annotation files; see [`AnnotationTable::from_sources`].
    pub fn from_files(
        filepaths: &[PathBuf],
        annotation_list: &[String],
    ) -> Result<Self, GWindowsError> {
        if filepaths.is_empty() {
            return Err(GWindowsError::NoInputFiles);
        }
        let mut sources = Vec::with_capacity(filepaths.len());
        for filepath in filepaths {
            let records: Vec<FeatureRecord> =
                AnnotationParser::open(filepath)?.collect::<Result<_, _>>()?;
            log::debug!("read {} records from {}", records.len(), filepath.display());
            sources.push(records);
        }
        Self::from_sources(sources, annotation_list)
    }

    /// Append an annotation to its chromosome.
    pub fn push(&mut self, seqname: String, annotation: Annotation) {
        self.chroms.entry(seqname).or_default().push(annotation);
    }

    /// Shrink every annotation to its start or stop base.
    ///
    /// Any restriction other than [`Restriction::All`] requires every annotation to
    /// have a strand.
    pub fn restrict(mut self, restriction: Restriction) -> Result<Self, GWindowsError> {
        if restriction == Restriction::All {
            return Ok(self);
        }
        for annotations in self.chroms.values_mut() {
            for annotation in annotations.iter_mut() {
                let strand = annotation
                    .strand
                    .ok_or(GWindowsError::RestrictionRequiresStrand)?;
                let at_start = matches!(
                    (restriction, strand),
                    (Restriction::Start, Strand::Forward) | (Restriction::Stop, Strand::Reverse)
                );
                if at_start {
                    annotation.end = annotation.start + 1;
                } else {
                    annotation.start = annotation.end - 1;
                }
            }
        }
        Ok(self)
    }

    /// Rename every chromosome; chromosomes whose names collide are merged.
    pub fn normalize_names(self, naming: ChromNaming) -> Self {
        let mut table = AnnotationTable::new(self.num_sources, self.num_labels);
        for (seqname, annotations) in self.chroms {
            table
                .chroms
                .entry(naming.normalize(&seqname))
                .or_default()
                .extend(annotations);
        }
        table
    }

    /// Keep the chromosomes in `include` (all when `None`), then drop those in
    /// `exclude`.
    pub fn retain_chroms(mut self, include: Option<&[String]>, exclude: Option<&[String]>) -> Self {
        self.chroms.retain(|seqname, _| {
            let included = include.map_or(true, |names| names.contains(seqname));
            let excluded = exclude.map_or(false, |names| names.contains(seqname));
            included && !excluded
        });
        self
    }

    /// The widest annotation span, or `None` for an empty table.
    pub fn max_width(&self) -> Option<Position> {
        self.iter_annotations().map(|(_, a)| a.width()).max()
    }

    /// Whether the table is non-empty and every annotation has a strand.
    pub fn is_stranded(&self) -> bool {
        !self.is_empty() && self.iter_annotations().all(|(_, a)| a.strand.is_some())
    }

    /// The largest annotation end on a chromosome.
    pub fn max_end(&self, seqname: &str) -> Option<Position> {
        self.chroms
            .get(seqname)
            .and_then(|annotations| annotations.iter().map(|a| a.end).max())
    }

    /// Build an interval tree for each chromosome, in chromosome order.
    pub fn trees(&self) -> Result<Vec<AnnotationTree>, GWindowsError> {
        self.chroms
            .values()
            .map(|annotations| AnnotationTree::new(annotations))
            .collect()
    }

    pub fn seqnames(&self) -> Vec<String> {
        self.chroms.keys().cloned().collect()
    }

    /// Iterate over chromosomes and their annotations.
    pub fn chroms(&self) -> impl Iterator<Item = (&String, &Vec<Annotation>)> {
        self.chroms.iter()
    }

    /// Get the annotations of a chromosome.
    pub fn get(&self, seqname: &str) -> Option<&[Annotation]> {
        self.chroms.get(seqname).map(|a| a.as_slice())
    }

    /// Iterate over every annotation with its chromosome name.
    pub fn iter_annotations(&self) -> impl Iterator<Item = (&str, &Annotation)> {
        self.chroms.iter().flat_map(|(seqname, annotations)| {
            annotations.iter().map(move |a| (seqname.as_str(), a))
        })
    }

    pub fn num_chroms(&self) -> usize {
        self.chroms.len()
    }

    /// The number of annotation sources (files).
    pub fn num_sources(&self) -> usize {
        self.num_sources
    }

    /// The number of label categories.
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// The total number of annotations.
    pub fn len(&self) -> usize {
        self.chroms.values().map(|a| a.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
