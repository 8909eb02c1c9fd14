use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::Level;

use crate::reporting::{run_average, run_report};

#[derive(Parser)]
#[command(version)]
#[command(about = "Aggregate benchmark logs and derive scaling metrics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity level (can be specified multiple times.) The first level sets level "info", second sets level "debug", and third sets level "trace" for the logger.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Average a compressor tool log into per-dataset CSV tables
    Average {
        /// Tool invocation log to read
        input: PathBuf,

        /// Directory receiving the generated CSV files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Build a scaling report from a set of sorting benchmark logs
    Report {
        /// Base path of the log set; <base>.log, <base>_mpi_strong.log and
        /// <base>_mpi_weak.log are read when present
        base: PathBuf,

        /// Output file; '-' prints CSV to stdout, a .md extension renders markdown
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
}

pub fn handle_calls() -> Result<()> {
    let cli = Cli::parse();
    let logger_level = match cli.verbose {
        0 => Level::Warn,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(logger_level.as_str())).init();

    match cli.command {
        Commands::Average { input, output_dir } => run_average(&input, &output_dir),
        Commands::Report { base, output } => run_report(&base, &output),
    }
}
