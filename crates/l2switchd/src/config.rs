//! Configuration file support for l2switchd
//!
//! Loads and validates controller configuration from TOML files.
//! Default location: /etc/sdn/l2switchd.toml

use crate::error::{L2SwitchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sdn/l2switchd.toml";

/// Address learning configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Seconds after which a learned address is forgotten. 0 disables aging.
    #[serde(default)]
    pub aging_time_secs: u64,
}

/// Flow rule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Priority of the catch-all rule installed when a switch connects
    #[serde(default = "default_table_miss_priority")]
    pub table_miss_priority: u16,

    /// Priority of learned source/destination flows
    #[serde(default = "default_flow_priority")]
    pub flow_priority: u16,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

/// Complete l2switchd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub learning: LearningConfig,

    #[serde(default)]
    pub flows: FlowConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_table_miss_priority() -> u16 {
    0
}

fn default_flow_priority() -> u16 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            table_miss_priority: default_table_miss_priority(),
            flow_priority: default_flow_priority(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl ControllerConfig {
    /// Load and validate configuration from file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => {
                let config: Self = toml::from_str(&content)?;
                config.validate()?;
                Ok(Some(config))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(L2SwitchError::Io(e)),
        }
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::load(path)?.unwrap_or_default())
    }

    /// Aging time as a Duration, `None` when aging is disabled
    pub fn aging_time(&self) -> Option<Duration> {
        match self.learning.aging_time_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.flows.flow_priority <= self.flows.table_miss_priority {
            return Err(L2SwitchError::config(format!(
                "flow_priority ({}) must be greater than table_miss_priority ({})",
                self.flows.flow_priority, self.flows.table_miss_priority
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(L2SwitchError::config("logging.level must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.learning.aging_time_secs, 0);
        assert_eq!(config.flows.table_miss_priority, 0);
        assert_eq!(config.flows.flow_priority, 1);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.aging_time(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ControllerConfig = toml::from_str(
            r#"
            [learning]
            aging_time_secs = 300

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.aging_time(), Some(Duration::from_secs(300)));
        assert_eq!(config.flows, FlowConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_flow_priority_not_above_table_miss() {
        let mut config = ControllerConfig::default();
        config.flows.table_miss_priority = 5;
        config.flows.flow_priority = 5;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must be greater than"));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ControllerConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ControllerConfig::load(dir.path().join("absent.toml")).unwrap(), None);

        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            ControllerConfig::load(file.path()).unwrap(),
            Some(ControllerConfig::default())
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[flows]\ntable_miss_priority = 0\nflow_priority = 10").unwrap();

        let config = ControllerConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.flows.flow_priority, 10);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[flows]\nflow_priority = \"high\"").unwrap();

        let err = ControllerConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, L2SwitchError::Toml(_)));
    }

    #[test]
    fn test_load_rejects_inverted_priorities() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[flows]\ntable_miss_priority = 2\nflow_priority = 1").unwrap();

        let err = ControllerConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, L2SwitchError::Config(_)));
    }
}
