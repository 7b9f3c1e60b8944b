//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Renderer settings.
    #[serde(default)]
    pub renderer: RendererSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.renderer.command.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "renderer.command must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// External renderer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RendererSettings {
    /// Command used to invoke mermaid-cli. Default: "mmdc".
    #[serde(default = "default_command")]
    pub command: String,

    /// Directory used when a request does not specify a folder.
    /// Default: the current working directory.
    #[serde(default = "default_output_dir")]
    pub default_output_dir: PathBuf,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            default_output_dir: default_output_dir(),
        }
    }
}

fn default_command() -> String {
    "mmdc".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.renderer.command, "mmdc");
        assert_eq!(config.renderer.default_output_dir, PathBuf::from("."));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "renderer": {
                "command": "/usr/local/bin/mmdc",
                "default_output_dir": "/var/diagrams"
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.renderer.command, "/usr/local/bin/mmdc");
        assert_eq!(
            config.renderer.default_output_dir,
            PathBuf::from("/var/diagrams")
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn reject_empty_command() {
        let json = r#"{
            "renderer": {
                "command": "  "
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
