//! Error types for inferjob.

use std::path::PathBuf;

/// Result type alias for inferjob operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for inferjob.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Cache directory could not be determined.
    #[error("could not determine cache directory for this platform")]
    CacheDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Memory size string could not be parsed.
    #[error("invalid memory size '{value}': {reason}")]
    InvalidMemory {
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Wall-clock limit could not be parsed.
    #[error("invalid time limit '{value}': {reason}")]
    InvalidTimeLimit {
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An external command could not be started.
    #[error("failed to start '{program}'")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Loading environment modules failed.
    #[error("failed to load modules [{modules}]: {reason}")]
    ModuleLoad {
        /// Modules requested, comma-separated.
        modules: String,
        /// Description of the failure.
        reason: String,
    },

    /// Activating a conda environment failed.
    #[error("failed to activate environment '{name}': {reason}")]
    EnvironmentActivation {
        /// Requested environment name.
        name: String,
        /// Description of the failure.
        reason: String,
    },

    /// No working directory was configured.
    #[error("no working directory configured (use --workdir, workdir.path or workdir.env_var)")]
    WorkdirUnset,

    /// Working directory variable named in config is not set.
    #[error("working directory variable '{var}' is not set")]
    WorkdirVarUnset {
        /// Variable name.
        var: String,
    },

    /// Working directory does not exist or cannot be entered.
    #[error("cannot change into working directory '{path}'")]
    WorkdirUnavailable {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the rendered batch script.
    #[error("failed to write batch script '{path}'")]
    ScriptWrite {
        /// Path to the script.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Job submission was rejected.
    #[error("job submission failed: {reason}")]
    Submit {
        /// Description of the failure.
        reason: String,
    },

    /// Failed to serialize the invocation plan.
    #[error("failed to serialize invocation plan")]
    PlanSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}
