//! Resource request and `#SBATCH` directive rendering.

use crate::config::ResourcesConfig;
use crate::error::{Error, Result};
use crate::scheduler::resources::{MemorySize, WallClock};
use std::fmt;

/// Validated resource request, consumed once by the scheduler at submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Job name.
    pub job_name: String,
    /// Number of tasks.
    pub ntasks: u32,
    /// CPUs per task.
    pub cpus_per_task: u32,
    /// Number of GPUs.
    pub gpus: u32,
    /// GPU model.
    pub gpu_type: String,
    /// Memory ceiling.
    pub memory: MemorySize,
    /// Wall-clock limit.
    pub time_limit: WallClock,
    /// Log path template.
    pub output: String,
    /// Partition.
    pub partition: Option<String>,
    /// Account.
    pub account: Option<String>,
}

impl TryFrom<&ResourcesConfig> for ResourceRequest {
    type Error = Error;

    fn try_from(cfg: &ResourcesConfig) -> Result<Self> {
        check_count("ntasks", cfg.ntasks)?;
        check_count("cpus_per_task", cfg.cpus_per_task)?;
        check_count("gpus", cfg.gpus)?;
        check_word("job_name", &cfg.job_name)?;
        check_word("gpu_type", &cfg.gpu_type)?;
        check_word("output", &cfg.output)?;
        if cfg.output.ends_with('/') {
            return Err(Error::ConfigValidation {
                message: format!("resources.output must name a file, got '{}'", cfg.output),
            });
        }
        if let Some(p) = &cfg.partition {
            check_word("partition", p)?;
        }
        if let Some(a) = &cfg.account {
            check_word("account", a)?;
        }

        Ok(Self {
            job_name: cfg.job_name.clone(),
            ntasks: cfg.ntasks,
            cpus_per_task: cfg.cpus_per_task,
            gpus: cfg.gpus,
            gpu_type: cfg.gpu_type.clone(),
            memory: cfg.memory.parse()?,
            time_limit: cfg.time_limit.parse()?,
            output: cfg.output.clone(),
            partition: cfg.partition.clone(),
            account: cfg.account.clone(),
        })
    }
}

fn check_count(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(Error::ConfigValidation {
            message: format!("resources.{field} must be at least 1"),
        });
    }
    Ok(())
}

// #SBATCH lines are parsed by the scheduler, not a shell, so values stay
// unquoted and must be single words.
fn check_word(field: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(Error::ConfigValidation {
            message: format!("resources.{field} must be a non-empty word without whitespace"),
        });
    }
    Ok(())
}

/// One scheduler directive: `--flag=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Long option name without dashes.
    pub flag: &'static str,
    /// Rendered value.
    pub value: String,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#SBATCH --{}={}", self.flag, self.value)
    }
}

impl ResourceRequest {
    /// Directives in the order they appear in the batch script.
    pub fn directives(&self) -> Vec<Directive> {
        let d = |flag, value: String| Directive { flag, value };
        let mut out = vec![
            d("job-name", self.job_name.clone()),
            d("ntasks", self.ntasks.to_string()),
            d("cpus-per-task", self.cpus_per_task.to_string()),
            d("gres", format!("gpu:{}:{}", self.gpu_type, self.gpus)),
            d("mem", self.memory.to_string()),
            d("time", self.time_limit.to_string()),
            d("output", self.output.clone()),
        ];
        if let Some(p) = &self.partition {
            out.push(d("partition", p.clone()));
        }
        if let Some(a) = &self.account {
            out.push(d("account", a.clone()));
        }
        out
    }
}
