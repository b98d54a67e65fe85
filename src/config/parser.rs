//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::{Hocon, HoconLoader};
use tracing::warn;

use crate::common::ConfigError;
use crate::config::env::apply_env_overrides;
use crate::config::types::Config;
use crate::config::validate::validate_config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.display().to_string(),
        source,
    })?;

    load_config_str(&content)
}

/// Load configuration from a HOCON string.
///
/// Syntax errors and unresolved values are rejected instead of silently
/// falling back to defaults.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    let hocon = HoconLoader::new()
        .strict()
        .load_str(content)
        .and_then(HoconLoader::hocon)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

    if let Some((key, e)) = find_bad_value(&hocon, "") {
        return Err(ConfigError::ParseError {
            message: format!("invalid value at '{}': {}", key, e),
        });
    }

    hocon.resolve().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

/// First unparseable value in the document, with its dotted key.
fn find_bad_value<'a>(hocon: &'a Hocon, path: &str) -> Option<(String, &'a hocon::Error)> {
    match hocon {
        Hocon::BadValue(e) => Some((path.to_string(), e)),
        Hocon::Hash(map) => map.iter().find_map(|(key, value)| {
            let path = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            find_bad_value(value, &path)
        }),
        Hocon::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, value)| find_bad_value(value, &format!("{}[{}]", path, i))),
        _ => None,
    }
}

/// Load the config file (or defaults when it is absent), apply environment
/// overrides and validate the result.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    let config = if path.exists() {
        load_config(path)?
    } else {
        warn!(
            "Config file {} not found, using defaults and environment variables",
            path.display()
        );
        Config::default()
    };

    let config = apply_env_overrides(config);
    validate_config(&config)?;
    Ok(config)
}
