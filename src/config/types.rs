//! Configuration type definitions.

use serde::Deserialize;

/// Default prefix for admin commands.
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Default location of the route database.
pub const DEFAULT_DATABASE_PATH: &str = "forwarding.db";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub forwarding: ForwardingConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Channels where admin commands are accepted (None = all channels).
    pub command_channels: Option<Vec<u64>>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            command_prefix: default_command_prefix(),
            command_channels: None,
        }
    }
}

/// Route database settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Forwarding behaviour.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ForwardingConfig {
    /// Send every embed again as its own message after the primary send,
    /// including the one already attached inline.
    #[serde(default = "default_true")]
    pub resend_embeds: bool,
    /// Relay messages authored by other bots and webhooks.
    #[serde(default = "default_true")]
    pub forward_bot_messages: bool,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            resend_embeds: true,
            forward_bot_messages: true,
        }
    }
}

fn default_command_prefix() -> String {
    DEFAULT_COMMAND_PREFIX.to_string()
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

fn default_true() -> bool {
    true
}
