//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `upstream.base_url`.
pub const ENV_BASE_URL: &str = "CANVAS_BASE_URL";

/// Environment variable overriding `listener.bind_address`.
pub const ENV_BIND_ADDRESS: &str = "CANVAS_PROXY_BIND";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Deserialize configuration from TOML text. No semantic validation.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Apply environment overrides on top of file/default values.
///
/// `lookup` is usually `|key| std::env::var(key).ok()`. Empty values are
/// ignored so an exported-but-blank variable does not erase the file value.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
        config.upstream.base_url = Some(base_url.trim().to_string());
    }
    if let Some(bind) = lookup(ENV_BIND_ADDRESS).filter(|v| !v.trim().is_empty()) {
        config.listener.bind_address = bind.trim().to_string();
    }
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config<F>(path: Option<&Path>, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            parse_config(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
