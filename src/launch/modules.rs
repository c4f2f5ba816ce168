//! Environment module loading.

use crate::config::ModulesConfig;
use crate::error::{Error, Result};
use crate::launch::capture::{EnvMap, capture_env};
use crate::utils::shell;
use std::fmt::Write as _;
use tracing::{info, warn};

/// Build the snippet that purges and loads the configured modules.
///
/// Returns `None` when there is nothing to do.
pub fn module_snippet(cfg: &ModulesConfig) -> Option<String> {
    if !cfg.purge && cfg.load.is_empty() {
        return None;
    }

    let mut snippet = String::new();
    if let Some(init) = &cfg.init {
        let _ = writeln!(snippet, "source {}", shell::quote(&init.to_string_lossy()));
    }
    if cfg.purge {
        snippet.push_str("module purge\n");
    }
    for name in &cfg.load {
        let _ = writeln!(snippet, "module load {}", shell::quote(name));
    }
    Some(snippet)
}

/// Purge and load modules on top of `base`, returning the resulting environment.
///
/// In non-strict mode a failure is logged and `base` is returned unchanged.
pub fn load_modules(cfg: &ModulesConfig, base: &EnvMap, trace: bool) -> Result<EnvMap> {
    let Some(snippet) = module_snippet(cfg) else {
        info!("No modules configured");
        return Ok(base.clone());
    };

    match capture_env(&snippet, base, trace) {
        Ok(env) => {
            info!("Loaded modules: {}", cfg.load.join(", "));
            Ok(env)
        }
        Err(e) if !cfg.strict => {
            warn!("Module loading failed, continuing without modules: {e}");
            Ok(base.clone())
        }
        Err(e) => Err(Error::ModuleLoad {
            modules: cfg.load.join(", "),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::launch::capture::var;
    use std::path::PathBuf;

    #[test]
    fn test_default_snippet_purges_then_loads_in_order() {
        let snippet = module_snippet(&ModulesConfig::default()).unwrap();
        assert_eq!(
            snippet,
            "module purge\nmodule load anaconda3\nmodule load multigpu\nmodule load a100\n"
        );
    }

    #[test]
    fn test_snippet_sources_init_first() {
        let cfg = ModulesConfig {
            init: Some(PathBuf::from("/etc/profile.d/lmod.sh")),
            purge: false,
            load: vec!["cuda/12.1".to_string()],
            strict: true,
        };
        assert_eq!(
            module_snippet(&cfg).unwrap(),
            "source /etc/profile.d/lmod.sh\nmodule load cuda/12.1\n"
        );
    }

    #[test]
    fn test_nothing_to_do() {
        let cfg = ModulesConfig {
            purge: false,
            load: Vec::new(),
            ..ModulesConfig::default()
        };
        assert!(module_snippet(&cfg).is_none());

        let mut base = EnvMap::new();
        base.insert("A".into(), "1".into());
        assert_eq!(load_modules(&cfg, &base, false).unwrap(), base);
    }

    // A shell function named `module` stands in for the module system.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_load_is_an_error_when_strict() {
        let cfg = ModulesConfig {
            init: None,
            purge: false,
            load: vec!["missing".to_string()],
            strict: true,
        };
        let mut base = EnvMap::new();
        base.insert("PATH".into(), "/usr/bin:/bin".into());
        base.insert(
            "BASH_FUNC_module%%".into(),
            "() {  return 1\n}".into(),
        );

        let err = load_modules(&cfg, &base, false).unwrap_err();
        assert!(matches!(err, Error::ModuleLoad { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_load_is_tolerated_when_not_strict() {
        let cfg = ModulesConfig {
            init: None,
            purge: false,
            load: vec!["missing".to_string()],
            strict: false,
        };
        let mut base = EnvMap::new();
        base.insert("PATH".into(), "/usr/bin:/bin".into());
        base.insert(
            "BASH_FUNC_module%%".into(),
            "() {  return 1\n}".into(),
        );

        assert_eq!(load_modules(&cfg, &base, false).unwrap(), base);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_successful_load_returns_new_environment() {
        let cfg = ModulesConfig {
            init: None,
            purge: false,
            load: vec!["anaconda3".to_string()],
            strict: true,
        };
        let mut base = EnvMap::new();
        base.insert("PATH".into(), "/usr/bin:/bin".into());
        base.insert(
            "BASH_FUNC_module%%".into(),
            "() {  export LOADEDMODULES=\"$2\"\n}".into(),
        );

        let env = load_modules(&cfg, &base, false).unwrap();
        assert_eq!(var(&env, "LOADEDMODULES"), Some("anaconda3"));
    }
}
