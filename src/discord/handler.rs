//! Discord message event handling.
//!
//! Feeds gateway messages through the dispatcher and hands command messages
//! to the route admin.

use serenity::model::channel::Message;
use serenity::model::guild::Guild;
use serenity::prelude::*;
use tracing::{debug, error, info};

use crate::discord::commands::RouteAdmin;
use crate::discord::inbound::inbound_message;
use crate::discord::transport::SerenityTransport;
use crate::forward::{Dispatcher, Disposition};

/// Discord event handler.
pub struct RelayHandler {
    dispatcher: Dispatcher,
    admin: RouteAdmin,
    /// HTTP client for attachment downloads.
    downloader: reqwest::Client,
}

impl RelayHandler {
    pub fn new(dispatcher: Dispatcher, admin: RouteAdmin, downloader: reqwest::Client) -> Self {
        Self {
            dispatcher,
            admin,
            downloader,
        }
    }

    pub async fn handle_message(&self, ctx: Context, msg: Message) {
        let inbound = inbound_message(&msg);

        // Ignore our own messages
        if inbound.author_id == ctx.cache.current_user().id {
            return;
        }

        let transport = SerenityTransport::new(ctx.clone(), self.downloader.clone());

        match self.dispatcher.dispatch(&transport, inbound).await {
            Disposition::Command => {
                if let Err(e) = self.admin.handle(&ctx, &transport, &msg).await {
                    error!("Command handler error: {}", e);
                }
            }
            Disposition::Ignored(reason) => {
                debug!("Message {} in {} not forwarded: {:?}", msg.id, msg.channel_id, reason);
            }
            // Logged by the dispatcher
            Disposition::Dropped(_) | Disposition::Emitted { .. } => {}
        }
    }

    pub fn handle_guild_create(&self, guild: &Guild) {
        info!(
            "Received guild data for '{}' ({} channels, {} custom emoji)",
            guild.name,
            guild.channels.len(),
            guild.emojis.len()
        );
    }
}
