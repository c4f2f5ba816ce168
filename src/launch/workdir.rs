//! Working directory resolution and the fail-fast directory check.

use crate::config::WorkdirConfig;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Pick the working directory.
///
/// Precedence: explicit override, then `workdir.path`, then the variable
/// named by `workdir.env_var` looked up through `lookup`.
pub fn resolve<F>(explicit: Option<&Path>, cfg: &WorkdirConfig, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &cfg.path {
        return Ok(path.clone());
    }
    if let Some(var) = &cfg.env_var {
        return lookup(var)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| Error::WorkdirVarUnset { var: var.clone() });
    }
    Err(Error::WorkdirUnset)
}

/// Confirm `path` is an existing directory and return its canonical form.
pub fn enter(path: &Path) -> Result<PathBuf> {
    let unavailable = |source| Error::WorkdirUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let canonical = path.canonicalize().map_err(unavailable)?;
    if !canonical.is_dir() {
        return Err(unavailable(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            "not a directory",
        )));
    }
    Ok(canonical)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unsafe_code)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn no_vars(_: &str) -> Option<OsString> {
        None
    }

    #[test]
    fn test_explicit_wins() {
        let cfg = WorkdirConfig {
            path: Some(PathBuf::from("/from/config")),
            env_var: Some("BASE".to_string()),
        };
        let got = resolve(Some(Path::new("/from/cli")), &cfg, no_vars).unwrap();
        assert_eq!(got, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_config_path_before_variable() {
        let cfg = WorkdirConfig {
            path: Some(PathBuf::from("/from/config")),
            env_var: Some("BASE".to_string()),
        };
        let got = resolve(None, &cfg, |_| Some("/from/var".into())).unwrap();
        assert_eq!(got, PathBuf::from("/from/config"));
    }

    #[test]
    fn test_variable_lookup() {
        let cfg = WorkdirConfig {
            path: None,
            env_var: Some("BASE".to_string()),
        };
        let got = resolve(None, &cfg, |name| {
            (name == "BASE").then(|| "/scratch/llm".into())
        })
        .unwrap();
        assert_eq!(got, PathBuf::from("/scratch/llm"));

        let err = resolve(None, &cfg, no_vars).unwrap_err();
        assert!(matches!(err, Error::WorkdirVarUnset { .. }));
        let err = resolve(None, &cfg, |_| Some(OsString::new())).unwrap_err();
        assert!(matches!(err, Error::WorkdirVarUnset { .. }));
    }

    #[test]
    #[serial]
    fn test_variable_lookup_from_process_environment() {
        let cfg = WorkdirConfig {
            path: None,
            env_var: Some("INFERJOB_TEST_BASE".to_string()),
        };
        unsafe {
            std::env::set_var("INFERJOB_TEST_BASE", "/scratch/from-env");
        }
        let got = resolve(None, &cfg, |name| std::env::var_os(name));
        unsafe {
            std::env::remove_var("INFERJOB_TEST_BASE");
        }
        assert_eq!(got.unwrap(), PathBuf::from("/scratch/from-env"));
    }

    #[test]
    fn test_nothing_configured() {
        let err = resolve(None, &WorkdirConfig::default(), no_vars).unwrap_err();
        assert!(matches!(err, Error::WorkdirUnset));
    }

    #[test]
    fn test_enter_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let got = enter(dir.path()).unwrap();
        assert_eq!(got, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_enter_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = enter(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::WorkdirUnavailable { .. }));
    }

    #[test]
    fn test_enter_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = enter(file.path()).unwrap_err();
        assert!(matches!(err, Error::WorkdirUnavailable { .. }));
    }
}
