//! Session configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no
//! file at all, via [`SessionConfig::default`]) is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::AppPriority;

const MAX_APP_NAME_LEN: usize = 64;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application identity reported to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name; empty lets the host pick one
    #[serde(default)]
    pub name: String,

    /// Description shown by the host
    #[serde(default = "default_description")]
    pub description: String,

    /// CPU priority requested from the host
    #[serde(default)]
    pub priority: AppPriority,
}

/// Registration behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// A second registration for an active domain replaces the first
    #[serde(default = "default_true")]
    pub replace_existing: bool,

    /// A session dropped without shutdown deregisters what it still holds
    #[serde(default = "default_true")]
    pub auto_deregister_on_drop: bool,
}

/// Local diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Complete session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_description() -> String {
    "NX-SDK application".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: default_description(),
            priority: AppPriority::default(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            replace_existing: default_true(),
            auto_deregister_on_drop: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SessionConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.app.name;
        if name.len() > MAX_APP_NAME_LEN {
            return Err(ConfigError::invalid(
                "app.name",
                format!("longer than {} characters", MAX_APP_NAME_LEN),
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid("app.name", "must not contain whitespace"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("unknown level '{}'", self.logging.level),
            ));
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
        let config = SessionConfig::default();
        assert!(config.bridge.replace_existing);
        assert!(config.bridge.auto_deregister_on_drop);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.app.priority, AppPriority::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = SessionConfig::from_toml_str(
            r#"
            [app]
            name = "customCliApp"
            priority = "high"

            [bridge]
            replace_existing = false
            "#,
        )
        .unwrap();
        assert_eq!(config.app.name, "customCliApp");
        assert_eq!(config.app.priority, AppPriority::High);
        assert_eq!(config.app.description, "NX-SDK application");
        assert!(!config.bridge.replace_existing);
        assert!(config.bridge.auto_deregister_on_drop);
    }

    #[test]
    fn test_invalid_log_level() {
        let err = SessionConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration for logging.level: unknown level 'loud'"
        );
    }

    #[test]
    fn test_invalid_app_name() {
        let err = SessionConfig::from_toml_str("[app]\nname = \"two words\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_parse_error() {
        let err = SessionConfig::from_toml_str("[bridge]\nreplace_existing = \"yes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[app]\nname = \"ribMgr\"").unwrap();

        let config = SessionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.app.name, "ribMgr");
    }

    #[test]
    fn test_missing_file() {
        let err = SessionConfig::from_file("/nonexistent/nxsdk.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
