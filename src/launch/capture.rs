//! Environment capture from shell snippets.
//!
//! Module systems and conda only expose shell functions, so each step runs a
//! snippet in a fresh `bash` seeded with an explicit environment and reads the
//! resulting environment back. Nothing in the launcher's own process changes.

use crate::constants::{ENV_CAPTURE_MARKER, SHELL, TRACE_TARGET};
use crate::utils::shell;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info};

/// An explicit process environment.
///
/// Names and values are kept as raw OS strings so variables that are not
/// valid UTF-8 reach the downstream program unchanged.
pub type EnvMap = BTreeMap<OsString, OsString>;

/// Variables describing the capturing shell itself rather than the environment.
const SHELL_LOCAL: &[&str] = &["PWD", "OLDPWD", "SHLVL", "_"];

/// Why a snippet's environment could not be captured.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The shell could not be started.
    #[error("could not start shell: {0}")]
    Spawn(#[source] std::io::Error),

    /// The snippet failed.
    #[error("shell exited with {0}")]
    Exit(ExitStatus),

    /// The shell finished without printing its environment.
    #[error("shell did not report its environment")]
    Missing,
}

/// The launcher's own environment, byte for byte.
pub fn current_env() -> EnvMap {
    std::env::vars_os().collect()
}

/// Value of `key` in `env`, if set and valid UTF-8.
pub fn var<'a>(env: &'a EnvMap, key: &str) -> Option<&'a str> {
    env.get(OsStr::new(key)).and_then(|v| v.to_str())
}

#[cfg(unix)]
fn os_string(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(bytes).to_os_string()
}

#[cfg(not(unix))]
fn os_string(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Wrap a snippet so it aborts on the first failing command and then dumps
/// its environment after a marker line.
fn wrap(snippet: &str, trace: bool) -> String {
    let mut script = String::from("set -e\n");
    if trace {
        script.push_str("set -x\n");
    }
    script.push_str(snippet);
    script.push('\n');
    if trace {
        script.push_str("{ set +x; } 2>/dev/null\n");
    }
    script.push_str(&format!("printf '\\n%s\\n' {ENV_CAPTURE_MARKER}\nenv -0\n"));
    script
}

/// Parse `env -0` output following the marker.
///
/// Returns `None` when the marker is absent.
fn parse(stdout: &[u8]) -> Option<(String, EnvMap)> {
    let marker = format!("\n{ENV_CAPTURE_MARKER}\n");
    let marker = marker.as_bytes();
    let pos = stdout.windows(marker.len()).position(|w| w == marker)?;

    let preamble = String::from_utf8_lossy(&stdout[..pos]).into_owned();
    let env = stdout[pos + marker.len()..]
        .split(|&b| b == 0)
        .filter_map(|entry| {
            let eq = entry.iter().position(|&b| b == b'=')?;
            let (key, value) = (&entry[..eq], &entry[eq + 1..]);
            let local = SHELL_LOCAL.iter().any(|name| name.as_bytes() == key);
            (!key.is_empty() && !local).then(|| (os_string(key), os_string(value)))
        })
        .collect();
    Some((preamble, env))
}

/// Run `snippet` in a shell seeded with `base` and return the environment it
/// leaves behind.
///
/// The shell's stderr is inherited so module and trace output lands in the
/// job log.
pub fn capture_env(snippet: &str, base: &EnvMap, trace: bool) -> Result<EnvMap, CaptureError> {
    if trace {
        for line in snippet.lines().filter(|l| !l.trim().is_empty()) {
            info!(target: TRACE_TARGET, "+ {line}");
        }
    }
    debug!("{} -c {}", SHELL, shell::quote(snippet));

    let output = Command::new(SHELL)
        .arg("-c")
        .arg(wrap(snippet, trace))
        .env_clear()
        .envs(base)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(CaptureError::Spawn)?;

    if !output.status.success() {
        return Err(CaptureError::Exit(output.status));
    }

    let (preamble, env) = parse(&output.stdout).ok_or(CaptureError::Missing)?;
    if !preamble.trim().is_empty() {
        debug!("snippet output: {}", preamble.trim());
    }
    Ok(env)
}
