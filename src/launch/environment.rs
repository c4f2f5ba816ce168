//! Conda environment activation.

use crate::config::EnvironmentConfig;
use crate::constants::ENV_CONDA_DEFAULT_ENV;
use crate::error::{Error, Result};
use crate::launch::capture::{EnvMap, capture_env, var};
use crate::utils::shell;
use tracing::info;

/// Snippet that initialises conda's shell hook and activates `name`.
pub fn activation_snippet(conda: &str, name: &str) -> String {
    format!(
        "eval \"$({} shell.bash hook)\"\nconda activate {}\n",
        shell::quote(conda),
        shell::quote(name)
    )
}

/// Name of the active conda environment, if any.
pub fn active_environment(env: &EnvMap) -> Option<&str> {
    var(env, ENV_CONDA_DEFAULT_ENV)
}

/// Check that `env` has `expected` active.
///
/// Environments given as a path report that path in `CONDA_PREFIX` rather
/// than `CONDA_DEFAULT_ENV`, so either is accepted.
fn verify(env: &EnvMap, expected: &str) -> Result<()> {
    let by_name = active_environment(env) == Some(expected);
    let by_prefix = var(env, "CONDA_PREFIX") == Some(expected);
    if by_name || by_prefix {
        return Ok(());
    }
    Err(Error::EnvironmentActivation {
        name: expected.to_string(),
        reason: format!(
            "active environment is '{}'",
            active_environment(env).unwrap_or("<none>")
        ),
    })
}

/// Activate one environment on top of `base`.
pub fn activate_one(conda: &str, name: &str, base: &EnvMap, trace: bool) -> Result<EnvMap> {
    let env = capture_env(&activation_snippet(conda, name), base, trace).map_err(|e| {
        Error::EnvironmentActivation {
            name: name.to_string(),
            reason: e.to_string(),
        }
    })?;
    verify(&env, name)?;
    info!(
        "Active environment: {}",
        active_environment(&env).unwrap_or(name)
    );
    Ok(env)
}

/// Activate the base environment, then the target one.
///
/// Returns `base` unchanged when activation is disabled.
pub fn activate(cfg: &EnvironmentConfig, base: &EnvMap, trace: bool) -> Result<EnvMap> {
    if !cfg.enabled {
        info!("Environment activation disabled");
        return Ok(base.clone());
    }

    let mut env = base.clone();
    if !cfg.base.is_empty() && cfg.base != cfg.name {
        env = activate_one(&cfg.conda, &cfg.base, &env, trace)?;
    }
    activate_one(&cfg.conda, &cfg.name, &env, trace)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).into(), (*v).into()))
            .collect()
    }

    #[test]
    fn test_activation_snippet() {
        assert_eq!(
            activation_snippet("conda", "llm"),
            "eval \"$(conda shell.bash hook)\"\nconda activate llm\n"
        );
        assert!(activation_snippet("/opt/conda/bin/conda", "my env").contains("'my env'"));
    }

    #[test]
    fn test_verify_by_name() {
        let env = env_with(&[("CONDA_DEFAULT_ENV", "llm")]);
        assert!(verify(&env, "llm").is_ok());
        assert!(verify(&env, "base").is_err());
    }

    #[test]
    fn test_verify_by_prefix() {
        let env = env_with(&[
            ("CONDA_DEFAULT_ENV", "/scratch/envs/llm"),
            ("CONDA_PREFIX", "/scratch/envs/llm"),
        ]);
        assert!(verify(&env, "/scratch/envs/llm").is_ok());
    }

    #[test]
    fn test_verify_nothing_active() {
        let err = verify(&EnvMap::new(), "llm").unwrap_err();
        assert!(err.to_string().contains("<none>"));
    }

    #[test]
    fn test_disabled_returns_base() {
        let cfg = EnvironmentConfig {
            enabled: false,
            ..EnvironmentConfig::default()
        };
        let base = env_with(&[("A", "1")]);
        assert_eq!(activate(&cfg, &base, false).unwrap(), base);
    }

    // A fake `conda` script on PATH would need to be exec'd right after being
    // written, so a `conda` shell function stands in instead: the hook prints
    // nothing and `activate` exports the variables real conda sets.
    #[cfg(target_os = "linux")]
    fn fake_conda_env() -> EnvMap {
        env_with(&[
            ("PATH", "/usr/bin:/bin"),
            (
                "BASH_FUNC_conda%%",
                "() {  if [ \"$1\" = activate ]; then export CONDA_DEFAULT_ENV=\"$2\" CONDA_PREFIX=\"/opt/conda/envs/$2\"; fi\n}",
            ),
        ])
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_activate_base_then_target() {
        let cfg = EnvironmentConfig {
            enabled: true,
            conda: "conda".to_string(),
            base: "base".to_string(),
            name: "llm".to_string(),
        };
        let env = activate(&cfg, &fake_conda_env(), false).unwrap();
        assert_eq!(active_environment(&env), Some("llm"));
        assert_eq!(
            var(&env, "CONDA_PREFIX"),
            Some("/opt/conda/envs/llm")
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_activation_that_does_not_stick_is_an_error() {
        let base = env_with(&[
            ("PATH", "/usr/bin:/bin"),
            ("BASH_FUNC_conda%%", "() {  :\n}"),
        ]);
        let err = activate_one("conda", "llm", &base, false).unwrap_err();
        assert!(matches!(err, Error::EnvironmentActivation { .. }));
    }
}
