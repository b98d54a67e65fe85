//! Per-message forwarding decision.
//!
//! Every inbound message is classified once: commands go to the admin
//! surface, messages from a paired source channel are repaired and emitted to
//! the target, and everything else is dropped silently.

use std::sync::Arc;

use serenity::model::id::ChannelId;
use tracing::{debug, error, info, warn};

use crate::common::AppError;
use crate::config::ForwardingConfig;
use crate::forward::emoji::EmojiResolver;
use crate::forward::message::InboundMessage;
use crate::forward::outbound::ContentReconstructor;
use crate::forward::transport::Transport;
use crate::store::{run_blocking, RouteStore};

/// Why a message was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A command-prefixed message from a bot.
    BotCommand,
    /// Bot authored and bot forwarding is disabled.
    BotAuthor,
    /// The channel is not a source.
    NoRoute,
    /// The channel is a source with no target yet.
    Unpaired,
}

/// Terminal state of one message.
#[derive(Debug)]
pub enum Disposition {
    /// Addressed to the bot; hand to the admin commands. Never forwarded.
    Command,
    Ignored(IgnoreReason),
    /// The route lookup or target resolution failed; the message is dropped.
    Dropped(AppError),
    /// Sends were attempted. Each one succeeds or fails on its own.
    Emitted {
        target: ChannelId,
        sent: usize,
        failed: usize,
    },
}

/// Routes inbound messages to their targets.
pub struct Dispatcher {
    store: Arc<dyn RouteStore>,
    resolver: EmojiResolver,
    reconstructor: ContentReconstructor,
    command_prefix: String,
    forward_bot_messages: bool,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn RouteStore>,
        command_prefix: impl Into<String>,
        forwarding: ForwardingConfig,
    ) -> Self {
        Self {
            store,
            resolver: EmojiResolver::new(),
            reconstructor: ContentReconstructor::new(forwarding.resend_embeds),
            command_prefix: command_prefix.into(),
            forward_bot_messages: forwarding.forward_bot_messages,
        }
    }

    /// Whether a message is addressed to the bot.
    pub fn is_command(&self, content: &str) -> bool {
        content.starts_with(&self.command_prefix)
    }

    /// Run one message through classification, lookup, repair and emission.
    pub async fn dispatch(&self, transport: &dyn Transport, msg: InboundMessage) -> Disposition {
        if self.is_command(&msg.content) {
            if msg.author_is_bot {
                return Disposition::Ignored(IgnoreReason::BotCommand);
            }
            return Disposition::Command;
        }

        if msg.author_is_bot && !self.forward_bot_messages {
            return Disposition::Ignored(IgnoreReason::BotAuthor);
        }

        let channel_id = msg.channel_id;
        let route = match run_blocking(&self.store, move |store| store.get(channel_id)).await {
            Ok(Some(route)) => route,
            Ok(None) => return Disposition::Ignored(IgnoreReason::NoRoute),
            Err(e) => {
                error!("Route lookup for channel {} failed: {}", msg.channel_id, e);
                return Disposition::Dropped(e.into());
            }
        };

        let Some(target) = route.target else {
            debug!("Source {} has no target, dropping message {}", route.source, msg.id);
            return Disposition::Ignored(IgnoreReason::Unpaired);
        };

        let kind = match transport.resolve_target(target).await {
            Ok(kind) => kind,
            Err(e) => {
                warn!("Dropping message {} from {}: {}", msg.id, msg.channel_id, e);
                return Disposition::Dropped(e.into());
            }
        };

        let catalog = transport.emoji_catalog();
        debug!(
            "Resolving emoji for message {} against {} visible emoji",
            msg.id,
            catalog.emoji_count()
        );
        let originating = msg.guild_id.and_then(|guild_id| catalog.guild(guild_id));

        let content = self.resolver.rewrite(&msg.content, originating, &catalog);
        let embeds = msg
            .embeds
            .into_iter()
            .map(|embed| embed.map_text(|text| self.resolver.rewrite(text, originating, &catalog)))
            .collect();

        let sends = self
            .reconstructor
            .build(content, embeds, msg.attachments, &msg.stickers);

        let mut sent = 0;
        let mut failed = 0;
        for send in &sends {
            match transport.send(target, send).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    error!("Failed {} send for message {}: {}", send.label(), msg.id, e);
                    failed += 1;
                }
            }
        }

        info!(
            "Forwarded message {} from {} to {:?} {} ({} sent, {} failed)",
            msg.id, msg.channel_id, kind, target, sent, failed
        );

        Disposition::Emitted {
            target,
            sent,
            failed,
        }
    }
}
