//! Configuration file parser for ~/.config/mosaic/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! CLI flags override file values, and the API token can also arrive via
//! the `MOSAIC_API_TOKEN` environment variable (which takes precedence).
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified; missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `api_token` so the secret never reaches logs
/// or error output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote feed service.
    pub api_base_url: String,

    /// Loopback port for the image proxy. 0 picks an ephemeral port.
    pub proxy_port: u16,

    /// Number of leading grid cells that load eagerly, skipping the
    /// viewport proximity gate.
    pub priority_cells: usize,

    /// Thumbnails kept in the in-memory LRU cache.
    pub thumbnail_cache_size: usize,

    /// Theme variant name ("dark" or "light").
    pub theme: String,

    /// API bearer token (alternative to the MOSAIC_API_TOKEN env var;
    /// the env var wins when both are set).
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api".to_string(),
            proxy_port: 0,
            priority_cells: 6,
            thumbnail_cache_size: crate::image::loader::DEFAULT_CACHE_CAPACITY,
            theme: "dark".to_string(),
            api_token: None,
        }
    }
}

/// Mask api_token in Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("proxy_port", &self.proxy_port)
            .field("priority_cells", &self.priority_cells)
            .field("thumbnail_cache_size", &self.thumbnail_cache_size)
            .field("theme", &self.theme)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080/api");
        assert_eq!(config.priority_cells, 6);
        assert_eq!(config.theme, "dark");
    }

    #[test]
    fn test_partial_config_keeps_remaining_defaults() {
        let config = Config::from_toml_str(
            r#"
            api_base_url = "https://photos.example.com/api"
            priority_cells = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://photos.example.com/api");
        assert_eq!(config.priority_cells, 9);
        assert_eq!(config.proxy_port, 0);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml_str("api_base_url = [broken"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_debug_masks_token() {
        let config = Config {
            api_token: Some("sekrit".to_string()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sekrit"));
        assert!(rendered.contains("REDACTED"));
    }
}
