//! Discord bot integration.
//!
//! This module connects the forwarding engine to Discord through serenity:
//! gateway events, admin commands, and the serenity-backed transport.

pub mod client;
pub mod commands;
pub mod handler;
pub mod inbound;
pub mod transport;

// Re-export main types for external use
pub use client::{http_client, DiscordBotBuilder};
pub use commands::RouteAdmin;
pub use handler::RelayHandler;
