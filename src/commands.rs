//! The dataset commands of the `gwindows` command line tool.
//!
//! Both commands build a dataset, then stream its rows in batches to a TSV of windows
//! and collect the labels of every batch into a single `.npy` file.

use rand::{rngs::StdRng, SeedableRng};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    continuous::ContinuousConfig,
    dataset::{DatasetLabels, DatasetSource, IntervalDataset},
    error::GWindowsError,
    io::OutputFile,
    reporting::{CommandOutput, Report},
    sequences::NucleotideSequences,
    sparse::SparseConfig,
    traits::WindowDataset,
};

/// The number of rows requested from a dataset at once.
pub const BATCH_SIZE: usize = 4096;

/// Where the rows of a dataset are written.
#[derive(Clone, Debug, Default)]
pub struct DatasetOutputs {
    /// The windows TSV; standard output if not set.
    pub windows: Option<PathBuf>,
    /// The labels `.npy` file; labels are not written if not set.
    pub labels: Option<PathBuf>,
    /// A FASTA file to add the sequence of each window from.
    pub fasta: Option<PathBuf>,
    /// Seed for the random sequence of placeholder windows.
    pub seed: u64,
}

/// Build a dataset from annotation files and write its windows and labels.
pub fn gwindows_sparse(
    filepaths: &[PathBuf],
    config: &SparseConfig,
    outputs: &DatasetOutputs,
) -> Result<CommandOutput<usize>, GWindowsError> {
    let dataset = IntervalDataset::new(
        &DatasetSource::Sparse(filepaths.to_vec()),
        None,
        config,
        &ContinuousConfig::default(),
    )?;
    write_dataset(&dataset, outputs)
}

/// Build a dataset from bedGraph signal files and write its windows and labels.
pub fn gwindows_continuous(
    genome: &Path,
    filepaths: &[PathBuf],
    config: &ContinuousConfig,
    outputs: &DatasetOutputs,
) -> Result<CommandOutput<usize>, GWindowsError> {
    if let DatasetSource::Sparse(_) = DatasetSource::detect(filepaths)? {
        return Err(GWindowsError::MixedDatasetSources);
    }
    let dataset = IntervalDataset::new(
        &DatasetSource::Continuous(filepaths.to_vec()),
        Some(genome),
        &SparseConfig::default(),
        config,
    )?;
    write_dataset(&dataset, outputs)
}

/// Write every row of `dataset`, returning the number of rows written.
pub fn write_dataset(
    dataset: &IntervalDataset,
    outputs: &DatasetOutputs,
) -> Result<CommandOutput<usize>, GWindowsError> {
    let sequences = outputs
        .fasta
        .as_ref()
        .map(|fasta| NucleotideSequences::from_fasta(fasta, None))
        .transpose()?;

    let mut columns = vec!["seqname", "start", "end", "strand", "index"];
    if sequences.is_some() {
        columns.push("sequence");
    }
    let header = Some(vec![columns.join("\t")]);
    let output_stream = outputs
        .windows
        .as_ref()
        .map_or(OutputFile::new_stdout(header.clone()), |file| {
            OutputFile::new(file, header.clone())
        });
    let mut writer = output_stream.writer()?;

    // for reporting stuff to the user
    let mut report = Report::new();

    let length = dataset.length() as usize;
    let pad = dataset.is_passthrough();
    let total = dataset.len();
    log::info!("writing {} rows with window length {}", total, length);

    let mut written = 0;
    let mut dropped = 0;
    let mut past_end = 0;
    let mut labels = Vec::new();
    let indices: Vec<usize> = (0..total).collect();
    for chunk in indices.chunks(BATCH_SIZE) {
        let batch = dataset.get(chunk)?;
        dropped += batch.warnings.len();
        let batch_len = batch.len();
        let mut kept = Vec::with_capacity(batch_len);
        let rows = batch.windows.iter().zip(&batch.indices).enumerate();
        for (position, (window, &index)) in rows {
            match &sequences {
                Some(sequences) => {
                    let mut rng = StdRng::seed_from_u64(outputs.seed ^ index as u64);
                    match sequences.window_sequence(window, length, pad, &mut rng) {
                        Ok(bases) => writeln!(writer, "{}\t{}\t{}", window, index, bases)?,
                        Err(GWindowsError::InvalidGenomicRangeForSequence(..)) => {
                            log::debug!("row {} ({}) extends past the sequence end", index, window);
                            past_end += 1;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => writeln!(writer, "{}\t{}", window, index)?,
            }
            kept.push(position);
        }
        written += kept.len();
        if let Some(batch_labels) = batch.labels {
            if kept.len() == batch_len {
                labels.push(batch_labels);
            } else {
                labels.push(batch_labels.select(&kept));
            }
        }
        log::debug!("wrote {} of {} rows", written, total);
    }
    writer.flush()?;

    if dropped > 0 {
        report.add_issue(format!(
            "{} rows were dropped because their windows extend past the sequence start",
            dropped
        ));
    }
    if past_end > 0 {
        report.add_issue(format!(
            "{} rows were dropped because their windows extend past the sequence end",
            past_end
        ));
    }

    if let Some(labels_path) = &outputs.labels {
        match DatasetLabels::concatenate(labels)? {
            Some(labels) => {
                labels.write_npy(labels_path)?;
                log::info!(
                    "wrote labels of shape {:?} to {}",
                    labels.shape(),
                    labels_path.display()
                );
            }
            None => report.add_issue(format!(
                "no labels were computed, so {} was not written",
                labels_path.display()
            )),
        }
    }

    Ok(CommandOutput::new(written, report))
}
