//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `COURIER_DISCORD_TOKEN` - Discord bot token
//! - `DISCORD_BOT_TOKEN` - Discord bot token (legacy name, lower precedence)
//! - `COURIER_COMMAND_PREFIX` - Prefix for admin commands
//! - `COURIER_DATABASE_PATH` - Location of the route database
//!
//! Variables from a `.env` file are visible here once `dotenvy` has loaded it.

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "COURIER";

/// Token variable understood by earlier deployments of the bot.
const LEGACY_TOKEN_VAR: &str = "DISCORD_BOT_TOKEN";

/// Apply environment variable overrides to a config.
///
/// This allows sensitive values like the token to be provided via
/// environment variables instead of the config file.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_with(config, |key| env::var(key).ok())
}

/// Apply overrides using an arbitrary variable lookup.
fn apply_overrides_with(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    // Discord token
    if let Some(token) = lookup(&format!("{}_DISCORD_TOKEN", ENV_PREFIX))
        .or_else(|| lookup(LEGACY_TOKEN_VAR))
    {
        config.discord.token = token;
    }

    if let Some(prefix) = lookup(&format!("{}_COMMAND_PREFIX", ENV_PREFIX)) {
        config.discord.command_prefix = prefix;
    }

    if let Some(path) = lookup(&format!("{}_DATABASE_PATH", ENV_PREFIX)) {
        config.storage.path = path;
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `COURIER_CONFIG` environment variable, otherwise returns "courier.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "courier.conf".to_string())
}
