//! Runtime configuration, read from TOML. Every field has a default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Form/webhook URL that receives new-order alerts.
    pub notify_endpoint: Option<String>,
    /// Seconds before a placed order is nudged to preparing.
    pub auto_advance_secs: u64,
    /// Request buffer of each store actor.
    pub actor_buffer: usize,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notify_endpoint: None,
            auto_advance_secs: 8,
            actor_buffer: 32,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn auto_advance(&self) -> Duration {
        Duration::from_secs(self.auto_advance_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            notify_endpoint = "https://formspree.io/f/abc123"
            auto_advance_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.notify_endpoint.as_deref(), Some("https://formspree.io/f/abc123"));
        assert_eq!(config.auto_advance(), Duration::from_secs(3));
        assert_eq!(config.actor_buffer, 32);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::from_toml_str("colour = \"green\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load(Path::new("/nonexistent/sapjuice.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sapjuice.toml"));
    }
}
