//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Path used when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/aether.toml";

/// Environment variable overriding `data_dir`.
pub const DATA_DIR_ENV: &str = "AETHER_DATA_DIR";

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        let config = if path.exists() {
            Self::load(path)?
        } else {
            Self::finish(Config::default())
        };
        Ok(config)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(Self::finish(config))
    }

    /// Apply the data dir override and expand `~` in every path.
    fn finish(mut config: Config) -> Config {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        config.data_dir = Self::expand_path_buf(&config.data_dir);
        config.actions.work_dir = config.actions.work_dir.as_deref().map(Self::expand_path_buf);
        config.orchestrator.dashboard_path = config
            .orchestrator
            .dashboard_path
            .as_deref()
            .map(Self::expand_path_buf);
        config.orchestrator.state_path = config
            .orchestrator
            .state_path
            .as_deref()
            .map(Self::expand_path_buf);
        config
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").unwrap_or_else(|e| panic!("invalid placeholder regex: {e}"))
        });

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.aether`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    fn expand_path_buf(path: &Path) -> PathBuf {
        match path.to_str() {
            Some(s) => PathBuf::from(Self::expand_path(s)),
            None => path.to_path_buf(),
        }
    }
}
