use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "doc_shrink")]
#[command(about = "Shrink PDF / docx / xlsx documents to a target size by re-encoding embedded images")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for the best (quality, scale) pair that fits the target size
    #[command(group(ArgGroup::new("target").required(true).args(["target_kb", "target_mb"])))]
    Shrink {
        /// Input document
        input: PathBuf,

        /// Output path (defaults to <stem>_compressed.<ext> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target size in kilobytes
        #[arg(long)]
        target_kb: Option<f64>,

        /// Target size in megabytes
        #[arg(long)]
        target_mb: Option<f64>,

        /// Document format: pdf, docx or xlsx (defaults to the input extension)
        #[arg(short, long)]
        format: Option<String>,

        /// Number of image workers per trial
        #[arg(short, long)]
        workers: Option<usize>,

        /// Search configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Suppress per-trial progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run a single trial at a fixed quality and scale
    Trial {
        /// Input document
        input: PathBuf,

        /// Output path for the trial artifact
        #[arg(short, long)]
        output: PathBuf,

        /// Encoder quality (1-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// Resampling factor in (0, 1]
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Document format: pdf, docx or xlsx (defaults to the input extension)
        #[arg(short, long)]
        format: Option<String>,

        /// Number of image workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// List the embedded images a document carries
    Inspect {
        /// Input document
        input: PathBuf,

        /// Document format: pdf, docx or xlsx (defaults to the input extension)
        #[arg(short, long)]
        format: Option<String>,
    },
}

/// `report.pdf` → `report_compressed.pdf`
pub fn default_output_path(input: &std::path::Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{stem}_compressed.{}", ext.to_string_lossy()),
        None => format!("{stem}_compressed"),
    };
    input.with_file_name(file_name)
}
