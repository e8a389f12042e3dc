//! Configuration traits
//!
//! Policy tables and ranking weights are plain values loaded once and
//! injected into the components that use them. Nothing reads configuration
//! from a global; tests build alternate tables directly.

use crate::{ConveneError, ConveneResult};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Core trait for Convene configuration types
pub trait ConfigSource: Clone + Default + DeserializeOwned + Send + Sync + 'static {
    /// Prefix of environment variables consulted by [`merge_with_env`](Self::merge_with_env).
    const ENV_PREFIX: &'static str;

    /// Parse and validate a TOML document.
    fn from_toml_str(content: &str) -> ConveneResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConveneError::invalid(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    fn load_from_file(path: &Path) -> ConveneResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConveneError::invalid(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `PREFIX_KEY=value` environment variables on top of this configuration.
    ///
    /// The prefix is stripped and the remainder lowercased before being handed
    /// to [`set_from_string`](Self::set_from_string).
    fn merge_with_env(&mut self) -> ConveneResult<()> {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix(Self::ENV_PREFIX) {
                self.set_from_string(&config_key.to_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Set one configuration value from its string form
    fn set_from_string(&mut self, key: &str, value: &str) -> ConveneResult<()>;

    /// Validate the configuration
    fn validate(&self) -> ConveneResult<()>;

    /// Defaults, then the optional file, then the environment, then validation.
    fn resolve(path: Option<&Path>) -> ConveneResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }
}

/// Parse an integer setting, naming the key on failure.
pub fn parse_setting<T>(key: &str, value: &str) -> ConveneResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConveneError::invalid(format!("Invalid value for {key}: {e}")))
}
