//! Configuration type definitions.

use crate::constants::{environment, modules, program, resources};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log every external command before it runs.
    pub trace: bool,

    /// Scheduler resource request.
    pub resources: ResourcesConfig,

    /// Environment modules.
    pub modules: ModulesConfig,

    /// Conda environments.
    pub environment: EnvironmentConfig,

    /// Working directory.
    pub workdir: WorkdirConfig,

    /// Downstream program.
    pub program: ProgramConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace: true,
            resources: ResourcesConfig::default(),
            modules: ModulesConfig::default(),
            environment: EnvironmentConfig::default(),
            workdir: WorkdirConfig::default(),
            program: ProgramConfig::default(),
        }
    }
}

/// Resources requested from the scheduler.
///
/// Memory and time are kept as strings here and parsed when rendered, so that
/// `config show` prints exactly what the user wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Job name.
    pub job_name: String,

    /// Number of tasks.
    pub ntasks: u32,

    /// CPUs per task.
    pub cpus_per_task: u32,

    /// Number of GPUs.
    pub gpus: u32,

    /// GPU model name (e.g. `A100`, `V100`).
    pub gpu_type: String,

    /// Memory ceiling (e.g. `300G`).
    pub memory: String,

    /// Wall-clock limit (e.g. `04:00:00`).
    pub time_limit: String,

    /// Log path template; `%j` is replaced by the job id.
    pub output: String,

    /// Partition to submit to.
    pub partition: Option<String>,

    /// Account to charge.
    pub account: Option<String>,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            job_name: resources::JOB_NAME.to_string(),
            ntasks: resources::NTASKS,
            cpus_per_task: resources::CPUS_PER_TASK,
            gpus: resources::GPUS,
            gpu_type: resources::GPU_TYPE.to_string(),
            memory: resources::MEMORY.to_string(),
            time_limit: resources::TIME_LIMIT.to_string(),
            output: resources::OUTPUT.to_string(),
            partition: None,
            account: None,
        }
    }
}

/// Environment modules loaded before activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Script sourced before any `module` command, for shells that do not
    /// inherit the `module` function (e.g. `/etc/profile.d/lmod.sh`).
    pub init: Option<PathBuf>,

    /// Run `module purge` first.
    pub purge: bool,

    /// Modules to load, in order.
    pub load: Vec<String>,

    /// Treat a failed load as fatal.
    pub strict: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            init: None,
            purge: true,
            load: modules::DEFAULT_LOAD.iter().map(ToString::to_string).collect(),
            strict: true,
        }
    }
}

/// Conda environment selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Activate environments at all.
    pub enabled: bool,

    /// Conda executable used for the shell hook.
    pub conda: String,

    /// Environment activated first.
    pub base: String,

    /// Environment the program runs in.
    pub name: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            conda: environment::CONDA_EXE.to_string(),
            base: environment::BASE.to_string(),
            name: String::new(),
        }
    }
}

/// Working directory resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkdirConfig {
    /// Literal directory.
    pub path: Option<PathBuf>,

    /// Name of an environment variable holding the directory.
    pub env_var: Option<String>,
}

/// Downstream program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Program and fixed leading arguments.
    pub command: Vec<String>,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            command: program::COMMAND.iter().map(ToString::to_string).collect(),
        }
    }
}
