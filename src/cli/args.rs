//! CLI argument definitions.

use crate::cli::validators::{parse_memory, parse_positive, parse_time_limit};
use crate::constants::{ENV_CONFIG, ENV_WORKDIR, submit::SBATCH};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Submit and launch GPU inference jobs on Slurm clusters.
#[derive(Debug, Parser)]
#[command(name = "inferjob")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prepare the environment and run the downstream program (inside the allocation).
    Run(RunArgs),
    /// Print or write the batch script without submitting it.
    Script {
        /// Write the script here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// What the script runs.
        #[command(flatten)]
        job: JobArgs,
    },
    /// Render the batch script and submit it with sbatch.
    Submit {
        /// Submission executable.
        #[arg(long, default_value = SBATCH)]
        sbatch: String,

        /// What the script runs.
        #[command(flatten)]
        job: JobArgs,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Working directory for the downstream program.
    #[arg(long, env = ENV_WORKDIR)]
    pub workdir: Option<PathBuf>,

    /// Check the working directory and print the invocation as JSON without running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Arguments forwarded verbatim to the downstream program (use `--` to be explicit).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<OsString>,
}

/// Arguments for `script` and `submit`.
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Pin the working directory in the script.
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Resource overrides.
    #[command(flatten)]
    pub resources: ResourceOverrides,

    /// Arguments forwarded to the downstream program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Per-submission resource overrides.
#[derive(Debug, Default, Args)]
pub struct ResourceOverrides {
    /// Job name.
    #[arg(long)]
    pub job_name: Option<String>,

    /// Number of GPUs.
    #[arg(long, value_parser = parse_positive)]
    pub gpus: Option<u32>,

    /// GPU model.
    #[arg(long)]
    pub gpu_type: Option<String>,

    /// Memory ceiling (e.g. 300G).
    #[arg(long, value_parser = parse_memory)]
    pub mem: Option<String>,

    /// Wall-clock limit (e.g. 04:00:00, 1-00:00:00).
    #[arg(long, value_parser = parse_time_limit)]
    pub time: Option<String>,

    /// Partition.
    #[arg(long)]
    pub partition: Option<String>,

    /// Account.
    #[arg(long)]
    pub account: Option<String>,
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}
