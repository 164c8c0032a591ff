//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate, lowest priority first:
//! 1. Built-in defaults (`defaults` module)
//! 2. JSON config file (explicit path, or the per-user config directory)
//! 3. `LAYER_VALIDATOR__<SECTION>__<KEY>` environment variables
//!
//! Command-line overrides are applied on top by the caller. The API credential
//! is not part of this configuration; it comes from the CLI or `NASA_API_KEY`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::domain::layer::Body;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub probe: ProbeConfig,
    pub logging: LoggingConfig,
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// JSON array of layer names
    pub layers_file: PathBuf,
    /// Pattern table (`{"layerTypes": {...}}`)
    pub patterns_file: PathBuf,
    /// Valid-layers output; the report is written next to it
    pub output_file: PathBuf,
}

/// Probe behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub concurrency_limit: usize,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub max_redirects: usize,
    pub use_system_proxy: bool,
    pub body: Body,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Write JSON lines to the log file instead of plain text
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Also log to this file when set
    pub file_path: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            layers_file: PathBuf::from(defaults::LAYERS_FILE),
            patterns_file: PathBuf::from(defaults::PATTERNS_FILE),
            output_file: PathBuf::from(defaults::OUTPUT_FILE),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: defaults::CONCURRENCY_LIMIT,
            timeout_seconds: defaults::TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            max_redirects: defaults::MAX_REDIRECTS,
            use_system_proxy: true,
            body: Body::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_path: None,
        }
    }
}

impl ProbeConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AppConfig {
    /// Checks value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.concurrency_limit == 0 {
            return Err(ConfigError::Validation {
                message: "probe.concurrency_limit must be at least 1".to_string(),
            });
        }

        if self.probe.timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                message: "probe.timeout_seconds must be at least 1".to_string(),
            });
        }

        if self.probe.max_redirects > defaults::MAX_REDIRECTS_LIMIT {
            return Err(ConfigError::Validation {
                message: format!(
                    "probe.max_redirects must not exceed {}",
                    defaults::MAX_REDIRECTS_LIMIT
                ),
            });
        }

        if self.probe.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "probe.user_agent must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration manager for loading and saving settings
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    /// Explicit config file; must exist when set
    explicit_path: Option<PathBuf>,
    /// Replaces the process environment as the env-var source
    env_source: Option<HashMap<String, String>>,
}

impl ConfigManager {
    #[must_use]
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self {
            explicit_path,
            env_source: None,
        }
    }

    /// Read environment overrides from `vars` instead of the process environment
    #[must_use]
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// Default per-user config file location
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::CONFIG_DIR_NAME).join(defaults::CONFIG_FILE_NAME))
    }

    /// Config file that `load_config` reads, if any
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> {
        self.explicit_path.clone().or_else(Self::default_config_path)
    }

    /// Load configuration from defaults, file and environment, then validate it
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        match (&self.explicit_path, Self::default_config_path()) {
            (Some(path), _) => {
                debug!("Loading configuration from {:?}", path);
                builder = builder.add_source(json_file(path).required(true));
            }
            (None, Some(path)) => {
                builder = builder.add_source(json_file(&path).required(false));
            }
            (None, None) => {}
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(self.env_source.clone()),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub async fn save_config(&self, config: &AppConfig, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        info!("Saved configuration to: {:?}", path);
        Ok(())
    }
}

fn json_file(path: &Path) -> config::File<config::FileSourceFile, config::FileFormat> {
    config::File::from(path).format(config::FileFormat::Json)
}

/// Default configuration values
pub mod defaults {
    /// Layer catalog read when no path is configured
    pub const LAYERS_FILE: &str = "resources/moon.json";

    /// Pattern table read when no path is configured
    pub const PATTERNS_FILE: &str = "resources/api.json";

    /// Valid-layers output file
    pub const OUTPUT_FILE: &str = "moon_validated.json";

    pub const CONCURRENCY_LIMIT: usize = 10;

    /// Per-probe timeout in seconds
    pub const TIMEOUT_SECONDS: u64 = 10;

    pub const MAX_REDIRECTS: usize = 10;

    /// Upper bound accepted for `max_redirects`
    pub const MAX_REDIRECTS_LIMIT: usize = 20;

    pub const USER_AGENT: &str = concat!("gibs-layer-validator/", env!("CARGO_PKG_VERSION"));

    pub const LOG_LEVEL: &str = "info";

    /// Prefix of environment overrides, e.g. `LAYER_VALIDATOR__PROBE__TIMEOUT_SECONDS`
    pub const ENV_PREFIX: &str = "LAYER_VALIDATOR";

    pub const CONFIG_DIR_NAME: &str = "gibs-layer-validator";
    pub const CONFIG_FILE_NAME: &str = "config.json";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_for(path: PathBuf) -> ConfigManager {
        ConfigManager::new(Some(path)).with_env_source(HashMap::new())
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe.concurrency_limit, 10);
        assert_eq!(config.probe.timeout(), Duration::from_secs(10));
        assert_eq!(config.probe.body, Body::Earth);
    }

    #[test]
    fn partial_file_is_merged_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"probe": {"concurrency_limit": 3, "body": "mars"}, "paths": {"output_file": "out.json"}}"#,
        )
        .unwrap();

        let config = manager_for(path).load_config().unwrap();
        assert_eq!(config.probe.concurrency_limit, 3);
        assert_eq!(config.probe.body, Body::Mars);
        assert_eq!(config.probe.timeout_seconds, defaults::TIMEOUT_SECONDS);
        assert_eq!(config.paths.output_file, PathBuf::from("out.json"));
        assert_eq!(config.paths.layers_file, PathBuf::from(defaults::LAYERS_FILE));
    }

    #[test]
    fn environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"probe": {"timeout_seconds": 30}}"#).unwrap();

        let env = HashMap::from([
            ("LAYER_VALIDATOR__PROBE__TIMEOUT_SECONDS".to_string(), "4".to_string()),
            ("LAYER_VALIDATOR__LOGGING__LEVEL".to_string(), "debug".to_string()),
        ]);
        let config = ConfigManager::new(Some(path))
            .with_env_source(env)
            .load_config()
            .unwrap();

        assert_eq!(config.probe.timeout_seconds, 4);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = manager_for(dir.path().join("absent.json")).load_config();
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"probe": {"concurrency_limit": 0}}"#).unwrap();
        assert!(matches!(
            manager_for(path.clone()).load_config(),
            Err(ConfigError::Validation { .. })
        ));

        std::fs::write(&path, r#"{"probe": {"max_redirects": 50}}"#).unwrap();
        assert!(matches!(
            manager_for(path).load_config(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn saved_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.probe.concurrency_limit = 7;
        config.logging.file_path = Some(PathBuf::from("validator.log"));

        let manager = manager_for(path.clone());
        manager.save_config(&config, &path).await.unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("token"));
        assert_eq!(manager.load_config().unwrap(), config);
    }
}
