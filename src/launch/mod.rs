//! In-allocation job launch.
//!
//! A launch walks through a fixed sequence of stages:
//!
//! ```text
//! Declared -> ModulesLoaded -> EnvironmentActivated -> DirectorySet -> Invoking
//! ```
//!
//! The working-directory check is the fail-fast point: if it fails the launch
//! ends with an error and the downstream program never starts. The environment
//! produced by each stage is passed explicitly to the next one.

pub mod capture;
pub mod environment;
pub mod invoke;
pub mod modules;
pub mod workdir;

use crate::config::Config;
use crate::constants::ENV_SLURM_JOB_ID;
use crate::error::Result;
use crate::scheduler::ResourceRequest;
use capture::{EnvMap, current_env, var};
use invoke::Invocation;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Launch stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Resource request accepted by the scheduler.
    Declared,
    /// Environment modules loaded.
    ModulesLoaded,
    /// Conda environment active.
    EnvironmentActivated,
    /// Working directory verified.
    DirectorySet,
    /// Downstream program running.
    Invoking,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Declared => "declared",
            Self::ModulesLoaded => "modules-loaded",
            Self::EnvironmentActivated => "environment-activated",
            Self::DirectorySet => "directory-set",
            Self::Invoking => "invoking",
        };
        f.write_str(name)
    }
}

/// Options for one launch.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Working directory override.
    pub workdir: Option<PathBuf>,
    /// Print the invocation instead of running it.
    pub dry_run: bool,
    /// Arguments forwarded to the downstream program.
    pub args: Vec<OsString>,
}

/// Outcome of a launch.
#[derive(Debug)]
pub enum Outcome {
    /// The program ran and exited with this code.
    Exited(i32),
    /// Dry run; the program was not started.
    Planned(Invocation),
}

/// Drives a launch through its stages.
pub struct Launcher<'a> {
    config: &'a Config,
    base_env: EnvMap,
}

impl<'a> Launcher<'a> {
    /// Launcher seeded with this process's environment.
    pub fn new(config: &'a Config) -> Self {
        Self::with_env(config, current_env())
    }

    /// Launcher seeded with an explicit environment.
    pub fn with_env(config: &'a Config, base_env: EnvMap) -> Self {
        Self { config, base_env }
    }

    fn enter_stage(stage: Stage) {
        info!(%stage, "Entering stage");
    }

    /// Run every stage and return the outcome.
    pub fn launch(&self, opts: &LaunchOptions) -> Result<Outcome> {
        let trace = self.config.trace;

        Self::enter_stage(Stage::Declared);
        self.log_declaration();

        // The dry run only needs the directory check; it never touches modules
        // or conda.
        let env = if opts.dry_run {
            self.base_env.clone()
        } else {
            Self::enter_stage(Stage::ModulesLoaded);
            let env = modules::load_modules(&self.config.modules, &self.base_env, trace)?;

            Self::enter_stage(Stage::EnvironmentActivated);
            environment::activate(&self.config.environment, &env, trace)?
        };

        Self::enter_stage(Stage::DirectorySet);
        let requested = workdir::resolve(opts.workdir.as_deref(), &self.config.workdir, |name| {
            env.get(OsStr::new(name)).cloned()
        })?;
        let cwd = workdir::enter(&requested)?;
        info!("Working directory: {}", cwd.display());

        let invocation = Invocation::new(&self.config.program.command, &opts.args, &cwd, env)?;
        if opts.dry_run {
            return Ok(Outcome::Planned(invocation));
        }

        Self::enter_stage(Stage::Invoking);
        let code = invocation.run(trace)?;
        info!("Downstream program exited with code {code}");
        Ok(Outcome::Exited(code))
    }

    fn log_declaration(&self) {
        let job_id = var(&self.base_env, ENV_SLURM_JOB_ID).unwrap_or("<none>");
        let host = hostname::get().map_or_else(
            |_| "unknown".to_string(),
            |h| h.to_string_lossy().into_owned(),
        );
        info!("Job {job_id} on {host}");

        match ResourceRequest::try_from(&self.config.resources) {
            Ok(request) => {
                for directive in request.directives() {
                    info!("{directive}");
                }
            }
            Err(e) => info!("Resource request not rendered: {e}"),
        }
    }
}
