//! bidscan command-line entry point

use anyhow::Result;
use bidscan_logging::{init_logging, LogConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "bidscan", version, about = "Inventory imaging files and their JSON sidecars")]
struct Cli {
    /// Enable verbose logging (debug events to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Only print warnings and errors to stderr
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Also write logs to a daily file in this directory
    #[arg(long, global = true, env = "BIDSCAN_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Walk a dataset and write one row per data file
    Scan {
        /// Dataset root (overrides root_directory from --config)
        path: Option<PathBuf>,

        /// TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the table here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Check that each sidecar exists; absent ones are written as "missing"
        #[arg(long)]
        verify_sidecars: bool,

        /// Visit directory entries in name order for reproducible output
        #[arg(long)]
        sort: bool,

        /// Stop at the first path outside the sub-*/ses-* layout
        #[arg(long)]
        strict: bool,

        /// Require the literal sub-/ses- prefixes and a non-empty label
        #[arg(long)]
        require_prefixes: bool,

        /// Tab-separated output
        #[arg(long)]
        tsv: bool,

        /// Log progress every N records
        #[arg(long)]
        progress_interval: Option<usize>,
    },

    /// Decode dataset-relative paths and print them as JSON
    Parse {
        /// Paths relative to the dataset root
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Scan {
            path,
            config,
            output,
            verify_sidecars,
            sort,
            strict,
            require_prefixes,
            tsv,
            progress_interval,
        } => cli::scan::run(cli::scan::ScanArgs {
            path,
            config,
            output,
            verify_sidecars,
            sort,
            strict,
            require_prefixes,
            tsv,
            progress_interval,
        }),
        Commands::Parse { paths } => cli::parse::run(cli::parse::ParseArgs { paths }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(LogConfig {
        app_name: "bidscan",
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_dir: cli.log_dir.as_deref(),
    }) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {:#}", err);
            None
        }
    };

    match run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(1)
        }
    }
}
