//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::ResourceRequest;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_plan(config)?;
    validate_environment(config)
}

/// Validate everything a dry run uses: resources, modules and the program.
pub fn validate_plan(config: &Config) -> Result<()> {
    ResourceRequest::try_from(&config.resources)?;
    validate_modules(config)?;
    validate_program(config)
}

fn validate_modules(config: &Config) -> Result<()> {
    for name in &config.modules.load {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(Error::ConfigValidation {
                message: format!("invalid module name '{name}'"),
            });
        }
    }
    Ok(())
}

fn validate_environment(config: &Config) -> Result<()> {
    let env = &config.environment;
    if !env.enabled {
        return Ok(());
    }
    if env.name.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "environment.name must be set (or set environment.enabled = false)"
                .to_string(),
        });
    }
    if env.conda.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "environment.conda must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_program(config: &Config) -> Result<()> {
    match config.program.command.first() {
        Some(program) if !program.is_empty() => Ok(()),
        _ => Err(Error::ConfigValidation {
            message: "program.command must start with a program".to_string(),
        }),
    }
}
