//! h5cmp: compare two solver outputs independent of cell ordering.
//!
//! Main entry point. Exits with 0 when every pair is the same, 1 on the
//! first difference and 2 when an input cannot be read as a mesh.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use h5cmp_core::{CompareConfig, ComparisonOutcome, Format};

/// Container format of the input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FileFormat {
    /// HDF5 files (`.h5`)
    H5,
    /// JSON container files (`.json`)
    Json,
}

impl From<FileFormat> for Format {
    fn from(f: FileFormat) -> Self {
        match f {
            FileFormat::H5 => Format::Hdf5,
            FileFormat::Json => Format::Json,
        }
    }
}

/// Compare two mesh files
#[derive(Parser, Debug)]
#[command(name = "h5cmp")]
#[command(version, about = "Compare two mesh files up to cell ordering", long_about = None)]
struct Args {
    /// First file to compare, without extension
    file1: String,

    /// Second file to compare, without extension
    file2: String,

    /// First iteration index (requires --end)
    #[arg(long)]
    start: Option<i64>,

    /// Last iteration index, inclusive (requires --start)
    #[arg(long)]
    end: Option<i64>,

    /// Input file format
    #[arg(long, value_enum, default_value_t = FileFormat::H5)]
    format: FileFormat,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print a summary after the run
    #[arg(long)]
    summary: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: Level,
}

impl Args {
    fn config(&self) -> CompareConfig {
        CompareConfig::single(&self.file1, &self.file2, self.format.into())
            .with_bounds(self.start, self.end)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = init_logging(args.log_level).and_then(|()| execute(&args));
    if let Err(e) = &result {
        eprintln!("error: {e:#}");
    }
    ExitCode::from(exit_code(&result))
}

/// 0 when every pair is the same, 1 on a difference, 2 on an error.
fn exit_code(result: &Result<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

fn init_logging(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing log subscriber")?;
    Ok(())
}

/// Run the comparison; `Ok(false)` means the files differ.
fn execute(args: &Args) -> Result<bool> {
    let config = args.config();
    let source = config.format.source()?;
    let report = h5cmp_core::run_with(&config, source.as_ref(), print_outcome)
        .with_context(|| format!("comparing {} and {}", config.file1, config.file2))?;

    if args.summary {
        report.print_summary();
    }
    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json())
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    Ok(report.passed())
}

fn print_outcome(outcome: &ComparisonOutcome) {
    match outcome.verdict.mismatch() {
        None => println!("{}", outcome.status_line()),
        Some(mismatch) => {
            println!("{mismatch}");
            eprintln!("{}", outcome.status_line());
        }
    }
}
