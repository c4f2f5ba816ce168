//! Configuration loading and management.

mod file;
mod paths;
mod types;
mod validate;

pub use file::{load_config, load_config_file, save_config};
pub use paths::{config_dir, config_file_path, script_dir};
pub use types::{
    Config, EnvironmentConfig, ModulesConfig, ProgramConfig, ResourcesConfig, WorkdirConfig,
};
pub use validate::{validate_config, validate_plan};
