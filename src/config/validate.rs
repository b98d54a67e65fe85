//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.token.is_empty() {
        errors.push(
            "discord.token is required (or set COURIER_DISCORD_TOKEN / DISCORD_BOT_TOKEN)"
                .to_string(),
        );
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }

    let prefix = &config.discord.command_prefix;
    if prefix.is_empty() {
        errors.push("discord.command_prefix must not be empty".to_string());
    } else if prefix.chars().any(char::is_whitespace) {
        errors.push(format!(
            "discord.command_prefix '{}' must not contain whitespace",
            prefix
        ));
    }

    if let Some(ref channels) = config.discord.command_channels {
        for (i, channel) in channels.iter().enumerate() {
            if *channel == 0 {
                errors.push(format!("discord.command_channels[{}] must be non-zero", i));
            }
        }
    }

    // Validate storage config
    if config.storage.path.trim().is_empty() {
        errors.push("storage.path is required".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
