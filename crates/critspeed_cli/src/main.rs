mod batch;
mod config;
mod legacy;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "critspeed",
    about = "Critical train speed from track and soil dispersion curves",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the critical speed for one configuration file
    Run {
        /// TOML or GoTrain YAML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
        /// Write the JSON result here instead of the path named in the config
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Compute every configuration file found under a directory
    Batch {
        /// Directory searched recursively for *.toml, *.yaml and *.yml files
        #[arg(short, long, value_name = "DIR")]
        dir: PathBuf,
        /// Worker threads (defaults to the number of logical CPUs)
        #[arg(short, long, value_name = "N")]
        workers: Option<usize>,
    },
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Run {
            config: config_path,
            output,
        } => {
            config::run_config(&config_path, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Batch { dir, workers } => {
            let workers = workers.unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            });
            let summary = batch::run_batch(&dir, workers)?;
            Ok(if summary.all_succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
