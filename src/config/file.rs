//! Configuration file loading.

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load configuration from a TOML file.
///
/// Returns default config if the file does not exist.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load configuration from an explicit path, or the platform default.
///
/// Returns the config together with the path it was (or would be) read from.
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, PathBuf)> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => super::config_file_path()?,
    };
    let config = load_config_file(&path)?;
    Ok((config, path))
}

/// Save configuration to a TOML file.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    std::fs::write(path, contents).map_err(|e| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_nonexistent_file_returns_default() {
        let path = Path::new("/nonexistent/path/config.toml");
        let config = load_config_file(path).unwrap();
        assert!(config.trace);
        assert!(config.workdir.path.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
trace = false

[resources]
gpu_type = "V100"
memory = "120G"

[modules]
load = ["anaconda3"]

[workdir]
path = "/scratch/llm"
"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert!(!config.trace);
        assert_eq!(config.resources.gpu_type, "V100");
        assert_eq!(config.resources.memory, "120G");
        assert_eq!(config.resources.gpus, 4);
        assert_eq!(config.modules.load, vec!["anaconda3"]);
        assert_eq!(config.workdir.path, Some(PathBuf::from("/scratch/llm")));
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let config = load_config_file(file.path());
        assert!(matches!(config, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_save_then_load_preserves_environment_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.environment.name = "llm-inference".to_string();
        save_config(&config, &path).unwrap();

        let (loaded, loaded_from) = load_config(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(loaded.environment.name, "llm-inference");
    }
}
