use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gwindows::{
    commands::{gwindows_continuous, gwindows_sparse, DatasetOutputs},
    prelude::*,
    reporting::CommandOutput,
    Position,
};

const INFO: &str = "\
gwindows: windowed training examples from genomic annotations and signal tracks
usage: gwindows [--help] <subcommand>

Subcommands:

  sparse: windows around BED/GFF/GTF annotations, with multi-hot labels.
  continuous: sliding windows over bedGraph signal, labelled with the signal.

";

#[derive(Parser)]
#[clap(name = "gwindows")]
#[clap(about = INFO)]
struct Cli {
    /// increase logging verbosity (-d for progress, -dd for debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Sparse {
        /// BED/GFF/GTF annotation files; each file is a separate label source
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// comma-separated feature names to keep, in label order
        #[arg(long, required = true, value_delimiter = ',')]
        labels: Vec<String>,

        /// window length: an integer, 'maxlen', or 'real' (the annotation itself)
        #[arg(long, default_value = "maxlen")]
        seq_len: String,

        /// data augmentation: 'none', 'all', or 'endpoints'
        #[arg(long, default_value = "none")]
        augmentation: String,

        /// restrict annotations to: 'all', 'start', or 'stop'
        #[arg(long, default_value = "all")]
        restriction: String,

        /// labelling: 'match-all', 'match-any', or 'seq2seq'
        #[arg(long, default_value = "match-all")]
        label_policy: String,

        /// negative windows per positive window: an integer, or 'all'
        #[arg(long, default_value = "1")]
        negative_ratio: String,

        /// negative windows: 'real', 'random', or 'none'
        #[arg(long, default_value = "real")]
        negative_type: String,

        #[command(flatten)]
        common: CommonArgs,
    },
    Continuous {
        /// a TSV genome file of chromosome names and their lengths
        #[arg(long, required = true)]
        seqlens: PathBuf,

        /// bedGraph signal files; each file is a separate track
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// window length
        #[arg(long, default_value_t = 1000)]
        window: Position,

        /// number of signal values per window
        #[arg(long, default_value_t = 1)]
        target_window: Position,

        /// signal reduction: 'none', 'mean', or 'downsampling'
        #[arg(long, default_value = "none")]
        downsampling: String,

        /// signal normalization: 'none', 'log', 'max', or 'zscore'
        #[arg(long, default_value = "none")]
        normalization: String,

        /// group the files into this many annotation types, listed file by file
        #[arg(long)]
        num_types: Option<usize>,

        /// slide windows so that their targets do not overlap
        #[arg(long)]
        non_overlapping: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// chromosome names: 'ucsc' (chr-prefixed) or 'numeric'
    #[arg(long, default_value = "ucsc")]
    chrom_naming: String,

    /// comma-separated chromosomes to keep (takes precedence over --exclude)
    #[arg(long, value_delimiter = ',')]
    include: Option<Vec<String>>,

    /// comma-separated chromosomes to drop
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// only write windows, skipping labels
    #[arg(long)]
    ignore_targets: bool,

    /// random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// an optional FASTA file, to add the sequence of each window
    #[arg(long)]
    fasta: Option<PathBuf>,

    /// an optional output file for the windows (standard output will be used if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// an optional .npy output file for the labels
    #[arg(long)]
    labels_output: Option<PathBuf>,
}

impl CommonArgs {
    fn outputs(&self) -> DatasetOutputs {
        DatasetOutputs {
            windows: self.output.clone(),
            labels: self.labels_output.clone(),
            fasta: self.fasta.clone(),
            seed: self.seed,
        }
    }
}

fn run() -> Result<CommandOutput<usize>, GWindowsError> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.debug {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    match &cli.command {
        Some(Commands::Sparse {
            files,
            labels,
            seq_len,
            augmentation,
            restriction,
            label_policy,
            negative_ratio,
            negative_type,
            common,
        }) => {
            let config = SparseConfig {
                annotation_list: labels.clone(),
                seq_len: seq_len.parse()?,
                augmentation: augmentation.parse()?,
                restriction: restriction.parse()?,
                label_policy: label_policy.parse()?,
                chrom_naming: common.chrom_naming.parse()?,
                include: common.include.clone(),
                exclude: common.exclude.clone(),
                ignore_targets: common.ignore_targets,
                negative_ratio: negative_ratio.parse()?,
                negative_type: negative_type.parse()?,
                seed: common.seed,
            };
            gwindows_sparse(files, &config, &common.outputs())
        }
        Some(Commands::Continuous {
            seqlens,
            files,
            window,
            target_window,
            downsampling,
            normalization,
            num_types,
            non_overlapping,
            common,
        }) => {
            let config = ContinuousConfig {
                window: *window,
                target_window: *target_window,
                downsampling: Downsampling::parse_option(downsampling)?,
                normalization: Normalization::parse_option(normalization)?,
                num_types: *num_types,
                stride: if *non_overlapping {
                    StridePolicy::NonOverlapping
                } else {
                    StridePolicy::Overlapping
                },
                chrom_naming: common.chrom_naming.parse()?,
                include: common.include.clone(),
                exclude: common.exclude.clone(),
                ignore_targets: common.ignore_targets,
            };
            gwindows_continuous(seqlens, files, &config, &common.outputs())
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    }
}

fn main() {
    match run() {
        Ok(output) => {
            if !output.report().is_empty() {
                eprint!("{}", output.report());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
