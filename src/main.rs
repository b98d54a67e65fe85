//! Courier - Discord channel forwarding bot
//!
//! Relays messages posted in source channels to paired target channels or
//! threads, repairing custom emoji that would not render on the other side.
//! Routes are managed with chat commands and persisted in SQLite.

mod common;
mod config;
mod discord;
mod forward;
mod store;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serenity::model::id::ChannelId;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use config::{env::get_config_path, load_and_validate, Config};
use discord::{http_client, DiscordBotBuilder, RelayHandler, RouteAdmin};
use forward::Dispatcher;
use store::{run_blocking, RouteStore, SqliteRouteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a .env file if present
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env file: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Courier v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let (config, store) = initialize(&config_path).map_err(|e| {
        error!("Startup failed: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Command prefix: {}", config.discord.command_prefix);
    info!("  Database: {}", config.storage.path);
    info!("  Re-send embeds: {}", config.forwarding.resend_embeds);
    info!("  Forward bot messages: {}", config.forwarding.forward_bot_messages);

    let routes = run_blocking(&store, |store| store.list()).await?;
    info!(
        "{} source channels configured, {} paired",
        routes.len(),
        routes.iter().filter(|route| route.is_paired()).count()
    );

    // One store instance shared by the dispatcher and the admin commands
    let command_channels = config
        .discord
        .command_channels
        .as_ref()
        .map(|ids| ids.iter().copied().map(ChannelId::new).collect());
    let dispatcher = Dispatcher::new(
        store.clone(),
        config.discord.command_prefix.clone(),
        config.forwarding,
    );
    let admin = RouteAdmin::new(store, config.discord.command_prefix.clone(), command_channels);
    let handler = RelayHandler::new(dispatcher, admin, http_client()?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let discord_bot = DiscordBotBuilder::new(config.discord.token.clone(), handler, shutdown_rx)
        .build()
        .await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(async move {
        discord_bot.run().await;
    });

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - disconnecting...");
            true
        }
        _ = &mut discord_task => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            warn!("Shutdown channel closed (Discord task already exited): {}", e);
        }
        let timeout = tokio::time::Duration::from_secs(5);
        match tokio::time::timeout(timeout, discord_task).await {
            Ok(Ok(())) => info!("Discord client stopped gracefully"),
            Ok(Err(e)) => warn!("Discord task panicked: {}", e),
            Err(_) => warn!("Discord shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}

/// Load configuration and open the route database.
fn initialize(config_path: &str) -> common::error::Result<(Config, Arc<dyn RouteStore>)> {
    let config = load_and_validate(config_path)?;
    let store = SqliteRouteStore::open(Path::new(&config.storage.path))?;
    Ok((config, Arc::new(store)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
