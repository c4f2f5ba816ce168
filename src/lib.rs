//! inferjob - submit and launch GPU inference jobs on Slurm clusters.
//!
//! `inferjob submit` renders a batch script with the job's resource request
//! and hands it to `sbatch`. Inside the allocation the script calls
//! `inferjob run`, which loads environment modules, activates a conda
//! environment, checks the working directory and runs the inference program
//! with the caller's arguments forwarded untouched.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod launch;
pub mod scheduler;
pub mod utils;

use chrono::Utc;
use clap::Parser;
use cli::{Cli, Command, ConfigAction, JobArgs, ResourceOverrides, RunArgs};
use config::{
    Config, ResourcesConfig, load_config, save_config, validate_config, validate_plan,
};
use constants::TRACE_TARGET;
use launch::{LaunchOptions, Launcher, Outcome};
use scheduler::{ResourceRequest, ScriptTarget, script, submit};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for the inferjob CLI.
///
/// Returns the process exit code: the downstream program's for `run`, zero
/// for everything else.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    let (config, config_path) = load_config(cli.global.config.as_deref())?;

    init_logging(cli.global.verbose, cli.global.quiet, config.trace);

    match cli.command {
        Command::Run(args) => run_job(&config, args),
        Command::Script { output, job } => {
            let contents = render_job_script(&config, &config_path, &job, true)?;
            match output {
                Some(path) => {
                    let path = script::write_script(&contents, &path)?;
                    info!("Wrote batch script: {}", path.display());
                }
                None => print!("{contents}"),
            }
            Ok(0)
        }
        Command::Submit { sbatch, job } => submit_job(&config, &config_path, &sbatch, &job),
        Command::Config { action } => {
            handle_config_command(action, &config, &config_path)?;
            Ok(0)
        }
    }
}

/// Run the job inside the allocation.
fn run_job(config: &Config, args: RunArgs) -> Result<i32> {
    // A dry run never activates conda, so the environment section may be
    // incomplete.
    if args.dry_run {
        validate_plan(config)?;
    } else {
        validate_config(config)?;
    }

    // The downstream program shares our process group and gets Ctrl+C
    // directly; its exit status is what we report.
    if let Err(e) = ctrlc::set_handler(|| {
        warn!("Interrupt received, waiting for the downstream program to exit");
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    let opts = LaunchOptions {
        workdir: args.workdir,
        dry_run: args.dry_run,
        args: args.args,
    };

    match Launcher::new(config).launch(&opts)? {
        Outcome::Exited(code) => Ok(code),
        Outcome::Planned(invocation) => {
            let json = serde_json::to_string_pretty(&invocation.plan())
                .map_err(|e| Error::PlanSerialize { source: e })?;
            println!("{json}");
            Ok(0)
        }
    }
}

/// Apply command-line overrides to the configured resources.
fn apply_overrides(base: &ResourcesConfig, overrides: &ResourceOverrides) -> ResourcesConfig {
    let mut resources = base.clone();
    if let Some(v) = &overrides.job_name {
        resources.job_name.clone_from(v);
    }
    if let Some(v) = overrides.gpus {
        resources.gpus = v;
    }
    if let Some(v) = &overrides.gpu_type {
        resources.gpu_type.clone_from(v);
    }
    if let Some(v) = &overrides.mem {
        resources.memory.clone_from(v);
    }
    if let Some(v) = &overrides.time {
        resources.time_limit.clone_from(v);
    }
    if overrides.partition.is_some() {
        resources.partition.clone_from(&overrides.partition);
    }
    if overrides.account.is_some() {
        resources.account.clone_from(&overrides.account);
    }
    resources
}

/// Render the batch script for `job`.
///
/// With `bake_args` the forwarded arguments are written into the script;
/// otherwise they are left for `sbatch` to pass as `$@`.
fn render_job_script(
    config: &Config,
    config_path: &Path,
    job: &JobArgs,
    bake_args: bool,
) -> Result<String> {
    let mut config = config.clone();
    config.resources = apply_overrides(&config.resources, &job.resources);
    validate_config(&config)?;
    let request = ResourceRequest::try_from(&config.resources)?;

    let launcher = std::env::current_exe()?;
    let config_file = if config_path.exists() {
        Some(config_path.canonicalize()?)
    } else {
        None
    };
    let workdir: Option<PathBuf> = job.workdir.as_deref().map(std::path::absolute).transpose()?;

    let target = ScriptTarget {
        launcher: &launcher,
        config: config_file.as_deref(),
        workdir: workdir.as_deref(),
        args: if bake_args { &job.args[..] } else { &[] },
        generated_at: Utc::now(),
    };
    Ok(scheduler::render(&request, &target))
}

/// Render, store and submit the batch script.
fn submit_job(config: &Config, config_path: &Path, sbatch: &str, job: &JobArgs) -> Result<i32> {
    let contents = render_job_script(config, config_path, job, false)?;

    let job_name = job
        .resources
        .job_name
        .as_deref()
        .unwrap_or(config.resources.job_name.as_str());
    let path = config::script_dir()?.join(script::script_file_name(
        job_name,
        Utc::now(),
        std::process::id(),
    ));
    script::write_script(&contents, &path)?;
    info!("Batch script: {}", path.display());

    let job_id = submit::submit(sbatch, &path, &job.args, config.trace)?;
    println!("Submitted batch job {job_id}");
    Ok(0)
}

/// Install the stderr subscriber.
///
/// With `trace` on, `+ <command>` lines are kept at every verbosity.
fn init_logging(verbose: u8, quiet: bool, trace: bool) {
    use tracing_subscriber::{EnvFilter, filter::Directive, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));
    if trace
        && let Ok(directive) = format!("{TRACE_TARGET}=info").parse::<Directive>()
    {
        filter = filter.add_directive(directive);
    }

    // stdout belongs to the downstream program and to command output.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_config_command(action: ConfigAction, config: &Config, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), path)?;
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps:");
                println!("  set environment.name and workdir.path, then run 'inferjob submit'");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let contents =
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;
            print!("{contents}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
