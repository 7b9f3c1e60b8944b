//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path specified via the CLI argument
//! 2. Default location:
//!    - **Linux/macOS:** `~/.mermaid-render-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.mermaid-render-mcp\config.json`
//!
//! A missing file at the default location is not an error; built-in defaults
//! apply. An explicitly specified path that does not exist is an error.

mod settings;

pub use settings::{Config, LoggingConfig, RendererSettings};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable that must point at the browser binary used by
/// mermaid-cli's embedded puppeteer. Checked once at startup.
pub const BROWSER_ENV_VAR: &str = "PUPPETEER_EXECUTABLE_PATH";

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.mermaid-render-mcp/`
/// - **Windows:** `%USERPROFILE%\.mermaid-render-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".mermaid-render-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, uses the platform-specific default location, falling
/// back to built-in defaults when no file exists there.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly specified configuration file does not exist
/// - The file cannot be read
/// - The JSON is malformed
/// - Validation fails
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            // No config file is fine; defaults cover everything.
            _ => return Ok(Config::default()),
        },
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}

/// Reads the required browser-binary environment variable.
///
/// The external renderer drives a headless browser; mermaid-cli locates that
/// browser through [`BROWSER_ENV_VAR`]. The variable is read exactly once,
/// at startup, and its absence is fatal before the transport opens.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] if the variable is unset or empty.
pub fn browser_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var_os(BROWSER_ENV_VAR) {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => Err(ConfigError::MissingEnvVar {
            name: BROWSER_ENV_VAR,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_dir_exists() {
        assert!(default_config_dir().is_some());
    }

    #[test]
    fn default_config_path_exists() {
        let path = default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("config.json"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/config.json")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn explicit_valid_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"renderer": {"command": "mmdc-test"}}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.renderer.command, "mmdc-test");
    }
}
