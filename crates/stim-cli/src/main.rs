//! stimscram - phase-scrambled control stimuli for EEG paradigms
//!
//! Turns face/car photographs into form-free controls that keep each
//! channel's amplitude spectrum and colour histogram.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;
mod naming;

use commands::batch::BalancePolicy;

#[derive(Parser)]
#[command(name = "stimscram")]
#[command(author, version, about = "Phase-scrambled control stimulus generator")]
#[command(long_about = "
Generates phase-scrambled control stimuli. One random phase field is shared
by the R, G and B channels of each image, and every channel is histogram
matched back to the original afterwards.

Examples:
  stimscram batch -i media --seed 1234           # face_*/car_* -> scrambled_*
  stimscram batch -i media -o out --class house --balance truncate
  stimscram scramble face_1.jpg -o scrambled_face_1.jpg --seed 7
  stimscram compare face_1.png scrambled_face_1.png --tolerance 0
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scramble a single image
    #[command(visible_alias = "s")]
    Scramble(ScrambleArgs),

    /// Scramble every <class>_<n> image in a directory
    #[command(visible_alias = "b")]
    Batch(BatchArgs),

    /// Compare an original with its scrambled version
    #[command(visible_alias = "c")]
    Compare(CompareArgs),
}

#[derive(Args)]
struct ScrambleArgs {
    /// Input image
    input: PathBuf,

    /// Output image (defaults to scrambled_<class>_<n>.<ext> beside the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Share of the original phase kept (0 = fully scrambled)
    #[arg(short, long, default_value = "0.0")]
    mix: f32,

    /// Random seed (omit for a fresh one)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value = "95", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
}

#[derive(Args)]
struct BatchArgs {
    /// Directory holding <class>_<n>.<ext> images
    #[arg(short, long, default_value = "media")]
    input_dir: PathBuf,

    /// Output directory (defaults to the input directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Stimulus classes, processed in the order given
    #[arg(short, long = "class", default_values_t = [String::from("face"), String::from("car")])]
    classes: Vec<String>,

    /// Share of the original phase kept (0 = fully scrambled)
    #[arg(short, long, default_value = "0.0")]
    mix: f32,

    /// Random seed for the whole batch (omit for a fresh one)
    #[arg(short, long)]
    seed: Option<u64>,

    /// What to do when classes end up with different counts
    #[arg(long, value_enum, default_value_t = BalancePolicy::Allow)]
    balance: BalancePolicy,

    /// Output format extension (defaults to each input's)
    #[arg(short, long)]
    format: Option<String>,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value = "95", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
}

#[derive(Args)]
struct CompareArgs {
    /// Original image
    original: PathBuf,

    /// Scrambled image
    scrambled: PathBuf,

    /// Fail if any channel's sorted values deviate by more than this
    #[arg(short, long)]
    tolerance: Option<f32>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `-v` steps from warn to trace.
/// The returned guard flushes the file writer and must outlive the command.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log.as_deref())?;

    match cli.command {
        Commands::Scramble(args) => commands::scramble::run(args, cli.verbose),
        Commands::Batch(args) => commands::batch::run(args, cli.verbose),
        Commands::Compare(args) => commands::compare::run(args, cli.verbose),
    }
}
