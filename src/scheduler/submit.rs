//! Job submission through `sbatch`.

use crate::constants::TRACE_TARGET;
use crate::constants::submit::SUBMITTED_PREFIX;
use crate::error::{Error, Result};
use crate::utils::shell;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Extract the job id from `sbatch` output (`Submitted batch job 12345`).
pub fn parse_job_id(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        line.trim()
            .strip_prefix(SUBMITTED_PREFIX)
            .and_then(|rest| rest.split_whitespace().next())
            .filter(|id| id.bytes().all(|b| b.is_ascii_digit()))
            .map(ToString::to_string)
    })
}

/// Submit a rendered script and return the scheduler's job id.
///
/// `args` are passed after the script path, where `sbatch` forwards them to
/// the script as `$@`.
pub fn submit(sbatch: &str, script: &Path, args: &[String], trace: bool) -> Result<String> {
    let mut cmd = Command::new(sbatch);
    cmd.arg(script).args(args);
    cmd.stdin(Stdio::null()).stderr(Stdio::piped()).stdout(Stdio::piped());

    if trace {
        let mut words = vec![OsStr::new(sbatch), script.as_os_str()];
        words.extend(args.iter().map(OsStr::new));
        info!(target: TRACE_TARGET, "+ {}", shell::join(words));
    }

    let output = cmd.output().map_err(|e| Error::Spawn {
        program: sbatch.to_string(),
        source: e,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!("sbatch stdout: {}", stdout.trim());

    if !output.status.success() {
        return Err(Error::Submit {
            reason: format!(
                "{sbatch} exited with {}: {}",
                output.status,
                stderr.trim()
            ),
        });
    }

    parse_job_id(&stdout).ok_or_else(|| Error::Submit {
        reason: format!("could not find a job id in {sbatch} output: {}", stdout.trim()),
    })
}
