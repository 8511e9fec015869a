//! Optional `sqlport.toml` configuration
//!
//! ```toml
//! [translate]
//! rules = "rules/custom.csv"
//! temp_schema = "scratch"
//! session_id = "abcd1234"
//!
//! [check]
//! max_identifier_length = 30
//! ```

use crate::error::{Error, Result};
use crate::translate::{CheckOptions, TranslateOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "sqlport.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub translate: TranslateConfig,
    pub check: CheckConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslateConfig {
    /// Rule file replacing the embedded rules
    pub rules: Option<PathBuf>,
    pub temp_schema: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    pub max_identifier_length: Option<usize>,
}

impl Config {
    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::ConfigError {
            message: e.to_string(),
        })
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::ConfigError {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let mut config = Self::parse(&text)?;

        // Relative rule paths are relative to the config file
        if let (Some(rules), Some(dir)) = (&config.translate.rules, path.parent()) {
            if rules.is_relative() {
                config.translate.rules = Some(dir.join(rules));
            }
        }
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `explicit` if given, else `sqlport.toml` in the working directory
    /// if it exists, else the defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(CONFIG_FILE);
                if local.is_file() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Translation options from this configuration
    pub fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            session_id: self.translate.session_id.clone(),
            temp_schema: self.translate.temp_schema.clone(),
            rule_path: self.translate.rules.clone(),
        }
    }

    /// Check options from this configuration
    pub fn check_options(&self) -> CheckOptions {
        let mut options = CheckOptions::default();
        if let Some(limit) = self.check.max_identifier_length {
            options.max_identifier_length = limit;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.check_options().max_identifier_length, 63);
        assert!(config.translate_options().session_id.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::parse("[translate]\nrulez = \"x\""),
            Err(Error::ConfigError { .. })
        ));
    }
}
