//! Downstream program invocation.

use crate::constants::{EXIT_FAILURE, SIGNAL_EXIT_OFFSET, TRACE_TARGET};
use crate::error::{Error, Result};
use crate::launch::capture::{EnvMap, var};
use crate::utils::shell;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, info};

/// Everything needed to start the downstream program.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Program to execute.
    pub program: OsString,
    /// Fixed leading arguments followed by the forwarded ones.
    pub args: Vec<OsString>,
    /// Directory the program starts in.
    pub cwd: PathBuf,
    /// Complete environment of the program.
    pub env: EnvMap,
}

/// JSON view of an [`Invocation`] printed by `run --dry-run`.
#[derive(Debug, Serialize)]
pub struct InvocationPlan {
    /// Program to execute.
    pub program: String,
    /// Arguments, lossily converted to UTF-8.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Active conda environment, if any.
    pub environment: Option<String>,
}

impl Invocation {
    /// Build an invocation from the configured command prefix and the
    /// forwarded arguments, which are appended untouched.
    ///
    /// A relative program path containing a separator is resolved against
    /// `cwd`, the directory it was written for.
    pub fn new(command: &[String], forwarded: &[OsString], cwd: &Path, env: EnvMap) -> Result<Self> {
        let (program, fixed) = command.split_first().ok_or_else(|| Error::ConfigValidation {
            message: "program.command must not be empty".to_string(),
        })?;

        let program_path = Path::new(program);
        let program = if program_path.is_relative() && program.contains('/') {
            cwd.join(program_path).into_os_string()
        } else {
            OsString::from(program)
        };

        let mut args: Vec<OsString> = fixed.iter().map(OsString::from).collect();
        args.extend(forwarded.iter().cloned());

        Ok(Self {
            program,
            args,
            cwd: cwd.to_path_buf(),
            env,
        })
    }

    /// Serializable summary.
    pub fn plan(&self) -> InvocationPlan {
        InvocationPlan {
            program: self.program.to_string_lossy().into_owned(),
            args: self
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            cwd: self.cwd.clone(),
            environment: var(&self.env, crate::constants::ENV_CONDA_DEFAULT_ENV)
                .map(ToString::to_string),
        }
    }

    /// The command line as a shell would show it.
    pub fn display(&self) -> String {
        shell::join(std::iter::once(&self.program).chain(&self.args))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .env_clear()
            .envs(&self.env)
            .env("PWD", &self.cwd);
        cmd
    }

    /// Start the program, wait for it, and return its exit code.
    pub fn run(&self, trace: bool) -> Result<i32> {
        if trace {
            info!(target: TRACE_TARGET, "+ {}", self.display());
        }
        let status = self
            .command()
            .status()
            .map_err(|e| Error::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source: e,
            })?;
        debug!("Downstream program finished: {status}");
        Ok(exit_code(status))
    }
}

/// Map a child's exit status to the launcher's exit code.
///
/// Signals follow the shell convention of `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_OFFSET + signal;
        }
    }
    EXIT_FAILURE
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    fn command(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_forwarded_args_appended_verbatim() {
        let forwarded = os(&["--model_name_or_path", "foo", "--batch_size", "8"]);
        let inv = Invocation::new(
            &command(&["python", "inference.py"]),
            &forwarded,
            Path::new("/scratch/llm"),
            EnvMap::new(),
        )
        .unwrap();

        assert_eq!(inv.program, OsString::from("python"));
        assert_eq!(
            inv.args,
            os(&["inference.py", "--model_name_or_path", "foo", "--batch_size", "8"])
        );
    }

    #[test]
    fn test_no_forwarded_args() {
        let inv = Invocation::new(
            &command(&["python", "inference.py"]),
            &[],
            Path::new("/scratch/llm"),
            EnvMap::new(),
        )
        .unwrap();
        assert_eq!(inv.args, os(&["inference.py"]));
    }

    #[test]
    fn test_relative_program_resolved_against_cwd() {
        let inv = Invocation::new(
            &command(&["./run.sh"]),
            &[],
            Path::new("/scratch/llm"),
            EnvMap::new(),
        )
        .unwrap();
        assert_eq!(inv.program, OsString::from("/scratch/llm/./run.sh"));
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(Invocation::new(&[], &[], Path::new("/"), EnvMap::new()).is_err());
    }

    #[test]
    fn test_plan_and_display() {
        let mut env = EnvMap::new();
        env.insert("CONDA_DEFAULT_ENV".into(), "llm".into());
        let inv = Invocation::new(
            &command(&["python", "inference.py"]),
            &os(&["--prompt_prefix", "Rewrite this:"]),
            Path::new("/scratch/llm"),
            env,
        )
        .unwrap();

        assert_eq!(
            inv.display(),
            "python inference.py --prompt_prefix 'Rewrite this:'"
        );
        let plan = inv.plan();
        assert_eq!(plan.environment.as_deref(), Some("llm"));
        assert_eq!(plan.args.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_propagates_exit_code() {
        let mut env = EnvMap::new();
        env.insert("PATH".into(), "/usr/bin:/bin".into());
        let inv = Invocation::new(
            &command(&["sh", "-c", "exit 7"]),
            &[],
            &std::env::temp_dir(),
            env,
        )
        .unwrap();
        assert_eq!(inv.run(false).unwrap(), 7);
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_maps_to_shell_convention() {
        let mut env = EnvMap::new();
        env.insert("PATH".into(), "/usr/bin:/bin".into());
        let inv = Invocation::new(
            &command(&["sh", "-c", "kill -TERM $$"]),
            &[],
            &std::env::temp_dir(),
            env,
        )
        .unwrap();
        assert_eq!(inv.run(false).unwrap(), 128 + 15);
    }
}
