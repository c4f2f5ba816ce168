//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "inferjob";

/// Exit status for every failure raised by the launcher itself.
///
/// Successful launches exit with the downstream program's own status instead.
pub const EXIT_FAILURE: i32 = 1;

/// Offset added to a signal number when the downstream program is killed by it.
pub const SIGNAL_EXIT_OFFSET: i32 = 128;

/// Environment variable overriding the config file location.
pub const ENV_CONFIG: &str = "INFERJOB_CONFIG";

/// Environment variable overriding the working directory.
pub const ENV_WORKDIR: &str = "INFERJOB_WORKDIR";

/// Scheduler-provided job identifier, logged for diagnostics.
pub const ENV_SLURM_JOB_ID: &str = "SLURM_JOB_ID";

/// Variable set by conda to the name of the active environment.
pub const ENV_CONDA_DEFAULT_ENV: &str = "CONDA_DEFAULT_ENV";

/// Scheduler resource defaults.
pub mod resources {
    /// Number of tasks per job.
    pub const NTASKS: u32 = 1;

    /// CPUs reserved per task.
    pub const CPUS_PER_TASK: u32 = 1;

    /// Number of accelerator devices.
    pub const GPUS: u32 = 4;

    /// Accelerator model requested from the scheduler.
    pub const GPU_TYPE: &str = "A100";

    /// Memory ceiling for the job.
    pub const MEMORY: &str = "300G";

    /// Wall-clock limit for the job.
    pub const TIME_LIMIT: &str = "04:00:00";

    /// Log destination; `%j` expands to the job id.
    pub const OUTPUT: &str = "logs/%j.out";

    /// Job name shown in the scheduler queue.
    pub const JOB_NAME: &str = "inferjob";
}

/// Environment module defaults.
pub mod modules {
    /// Modules loaded after the purge, in order.
    pub const DEFAULT_LOAD: &[&str] = &["anaconda3", "multigpu", "a100"];
}

/// Conda environment defaults.
pub mod environment {
    /// Environment activated before the target one.
    pub const BASE: &str = "base";

    /// Executable providing the shell hook.
    pub const CONDA_EXE: &str = "conda";
}

/// Downstream program defaults.
pub mod program {
    /// Command prefix; forwarded arguments are appended after it.
    pub const COMMAND: &[&str] = &["python", "inference.py"];
}

/// Scheduler submission.
pub mod submit {
    /// Submission executable.
    pub const SBATCH: &str = "sbatch";

    /// Prefix printed by `sbatch` before the job id.
    pub const SUBMITTED_PREFIX: &str = "Submitted batch job";

    /// Extension for rendered batch scripts.
    pub const SCRIPT_EXTENSION: &str = "sbatch";
}

/// Log target for `+ <command>` trace lines.
pub const TRACE_TARGET: &str = "inferjob::trace";

/// Shell used to evaluate module and conda snippets.
pub const SHELL: &str = "bash";

/// Separator between the snippet output and the captured environment.
pub const ENV_CAPTURE_MARKER: &str = "__INFERJOB_ENV_BEGIN__";
