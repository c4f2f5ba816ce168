//! Batch script rendering.
//!
//! The rendered script carries the resource directives and hands control back
//! to `inferjob run` inside the allocation, so module loading, activation and
//! the working-directory check all happen in one place.

use crate::constants::{APP_NAME, submit::SCRIPT_EXTENSION};
use crate::error::{Error, Result};
use crate::scheduler::ResourceRequest;
use crate::utils::shell;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// What the batch script runs once the allocation starts.
#[derive(Debug, Clone)]
pub struct ScriptTarget<'a> {
    /// Absolute path to the `inferjob` executable.
    pub launcher: &'a Path,
    /// Config file passed through with `--config`.
    pub config: Option<&'a Path>,
    /// Working directory pinned at render time.
    pub workdir: Option<&'a Path>,
    /// Arguments baked into the script, placed before `"$@"`.
    pub args: &'a [String],
    /// Render timestamp recorded in the header.
    pub generated_at: DateTime<Utc>,
}

/// Render a complete batch script.
pub fn render(request: &ResourceRequest, target: &ScriptTarget<'_>) -> String {
    let mut out = String::from("#!/bin/bash\n");
    for directive in request.directives() {
        let _ = writeln!(out, "{directive}");
    }
    let _ = writeln!(
        out,
        "\n# Generated by {APP_NAME} {} at {}.",
        env!("CARGO_PKG_VERSION"),
        target.generated_at.to_rfc3339()
    );
    let _ = writeln!(out, "# Arguments given to sbatch after the script name are forwarded.\n");

    let mut words = vec![
        "exec".to_string(),
        shell::quote(&target.launcher.to_string_lossy()).into_owned(),
    ];
    if let Some(config) = target.config {
        words.push("--config".to_string());
        words.push(shell::quote(&config.to_string_lossy()).into_owned());
    }
    words.push("run".to_string());
    if let Some(workdir) = target.workdir {
        words.push("--workdir".to_string());
        words.push(shell::quote(&workdir.to_string_lossy()).into_owned());
    }
    words.push("--".to_string());
    words.extend(target.args.iter().map(|a| shell::quote(a).into_owned()));
    words.push("\"$@\"".to_string());

    let _ = writeln!(out, "{}", words.join(" "));
    out
}

/// File name for a script submitted at `now` by process `pid`.
pub fn script_file_name(job_name: &str, now: DateTime<Utc>, pid: u32) -> String {
    format!(
        "{job_name}-{}-{pid}.{SCRIPT_EXTENSION}",
        now.format("%Y%m%dT%H%M%S")
    )
}

/// Write a script and mark it executable.
pub fn write_script(contents: &str, path: &Path) -> Result<PathBuf> {
    let err = |source| Error::ScriptWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(err)?;
    }
    std::fs::write(path, contents).map_err(err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(err)?;
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ResourcesConfig;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap()
    }

    fn request() -> ResourceRequest {
        ResourceRequest::try_from(&ResourcesConfig::default()).unwrap()
    }

    #[test]
    fn test_render_directives_precede_command() {
        let target = ScriptTarget {
            launcher: Path::new("/opt/bin/inferjob"),
            config: None,
            workdir: None,
            args: &[],
            generated_at: fixed_time(),
        };
        let script = render(&request(), &target);

        assert!(script.starts_with("#!/bin/bash\n#SBATCH --job-name=inferjob\n"));
        assert!(script.contains("#SBATCH --gres=gpu:A100:4\n"));
        assert!(script.contains("2026-03-01T12:30:00+00:00"));
        assert!(script.ends_with("exec /opt/bin/inferjob run -- \"$@\"\n"));

        let last_directive = script.rfind("#SBATCH").unwrap();
        let exec = script.find("exec ").unwrap();
        assert!(last_directive < exec);
    }

    #[test]
    fn test_render_quotes_baked_arguments() {
        let args = vec![
            "--prompt_prefix".to_string(),
            "I want you to simplify: it's".to_string(),
            "--few_shot_n".to_string(),
            "3".to_string(),
        ];
        let target = ScriptTarget {
            launcher: Path::new("/opt/my tools/inferjob"),
            config: Some(Path::new("/home/u/.config/inferjob/config.toml")),
            workdir: Some(Path::new("/scratch/u/llm")),
            args: &args,
            generated_at: fixed_time(),
        };
        let script = render(&request(), &target);

        assert!(script.contains(
            "exec '/opt/my tools/inferjob' --config /home/u/.config/inferjob/config.toml \
             run --workdir /scratch/u/llm -- --prompt_prefix 'I want you to simplify: it'\\''s' \
             --few_shot_n 3 \"$@\"\n"
        ));
    }

    #[test]
    fn test_script_file_name() {
        assert_eq!(
            script_file_name("inferjob", fixed_time(), 4242),
            "inferjob-20260301T123000-4242.sbatch"
        );
    }

    #[test]
    fn test_write_script_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("job.sbatch");
        write_script("#!/bin/bash\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#!/bin/bash\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }
}
