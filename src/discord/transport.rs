//! Serenity-backed implementation of the forwarding transport.

use serenity::all::{
    Channel, ChannelId, ChannelType, Context, CreateAllowedMentions, CreateAttachment,
    CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage,
};
use serenity::async_trait;
use tracing::{debug, warn};

use crate::common::{ForwardError, ForwardResult};
use crate::forward::emoji::{CatalogEmoji, EmojiCatalog, GuildEmojis};
use crate::forward::message::{AttachmentRef, RelayEmbed};
use crate::forward::outbound::{MentionPolicy, OutboundSend};
use crate::forward::transport::{TargetKind, Transport};

/// Sends through the gateway context of the event being handled.
pub struct SerenityTransport {
    ctx: Context,
    /// Client used to fetch attachments for re-upload.
    downloader: reqwest::Client,
}

impl SerenityTransport {
    pub fn new(ctx: Context, downloader: reqwest::Client) -> Self {
        Self { ctx, downloader }
    }

    async fn download(
        &self,
        attachment: &AttachmentRef,
    ) -> Result<CreateAttachment, reqwest::Error> {
        let bytes = self
            .downloader
            .get(&attachment.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(CreateAttachment::bytes(bytes.to_vec(), attachment.filename.clone()))
    }

    /// Build the message for a send. `None` when nothing is left to send.
    async fn build_message(&self, send: &OutboundSend) -> Option<CreateMessage> {
        match send {
            OutboundSend::Primary {
                content,
                embed,
                attachments,
                mentions,
            } => {
                let mut files = Vec::with_capacity(attachments.len());
                for attachment in attachments {
                    match self.download(attachment).await {
                        Ok(file) => files.push(file),
                        Err(e) => warn!(
                            "Skipping attachment {} ({}): {}",
                            attachment.filename, attachment.url, e
                        ),
                    }
                }
                primary_message(content, embed.as_ref(), files, *mentions)
            }
            OutboundSend::Sticker(sticker_id) => Some(CreateMessage::new().sticker_id(*sticker_id)),
            OutboundSend::Embed(embed) => Some(
                CreateMessage::new()
                    .embed(build_embed(embed))
                    .allowed_mentions(allowed_mentions(MentionPolicy::NONE)),
            ),
        }
    }
}

#[async_trait]
impl Transport for SerenityTransport {
    async fn resolve_target(&self, channel_id: ChannelId) -> ForwardResult<TargetKind> {
        let channel = channel_id.to_channel(&self.ctx).await.map_err(|e| {
            debug!("Lookup of channel {} failed: {}", channel_id, e);
            ForwardError::TargetUnresolvable { channel_id }
        })?;

        match channel {
            Channel::Guild(channel) => {
                target_kind(channel.kind).ok_or_else(|| ForwardError::InvalidTarget {
                    channel_id,
                    kind: format!("{:?}", channel.kind).to_lowercase(),
                })
            }
            _ => Err(ForwardError::InvalidTarget {
                channel_id,
                kind: "private".to_string(),
            }),
        }
    }

    async fn send(&self, channel_id: ChannelId, send: &OutboundSend) -> ForwardResult<()> {
        let Some(builder) = self.build_message(send).await else {
            warn!(
                "Skipping {} send to {}: no content left after attachment downloads",
                send.label(),
                channel_id
            );
            return Ok(());
        };

        channel_id
            .send_message(&self.ctx, builder)
            .await
            .map(|_| ())
            .map_err(|e| ForwardError::SendFailed {
                channel_id,
                message: e.to_string(),
            })
    }

    fn emoji_catalog(&self) -> EmojiCatalog {
        let cache = &self.ctx.cache;

        let guilds = cache
            .guilds()
            .into_iter()
            .filter_map(|guild_id| {
                let guild = cache.guild(guild_id)?;
                let emojis = guild
                    .emojis
                    .values()
                    .map(|emoji| CatalogEmoji {
                        id: emoji.id,
                        name: emoji.name.clone(),
                        animated: emoji.animated,
                    })
                    .collect();
                Some(GuildEmojis::new(guild_id, emojis))
            })
            .collect();

        EmojiCatalog::new(guilds)
    }
}

/// Channel kinds that accept relayed messages.
pub fn target_kind(kind: ChannelType) -> Option<TargetKind> {
    match kind {
        ChannelType::Text | ChannelType::News => Some(TargetKind::Channel),
        ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread => {
            Some(TargetKind::Thread)
        }
        _ => None,
    }
}

/// The primary message, or `None` when it would be empty.
fn primary_message(
    content: &str,
    embed: Option<&RelayEmbed>,
    files: Vec<CreateAttachment>,
    mentions: MentionPolicy,
) -> Option<CreateMessage> {
    if content.is_empty() && embed.is_none() && files.is_empty() {
        return None;
    }

    let mut builder = CreateMessage::new().allowed_mentions(allowed_mentions(mentions));
    if !content.is_empty() {
        builder = builder.content(content);
    }
    if let Some(embed) = embed {
        builder = builder.embed(build_embed(embed));
    }
    Some(builder.add_files(files))
}

fn allowed_mentions(policy: MentionPolicy) -> CreateAllowedMentions {
    CreateAllowedMentions::new()
        .everyone(policy.everyone)
        .all_users(policy.users)
        .all_roles(policy.roles)
        .replied_user(false)
}

fn build_embed(embed: &RelayEmbed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();

    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    if let Some(url) = &embed.url {
        builder = builder.url(url);
    }
    if let Some(colour) = embed.colour {
        builder = builder.colour(colour);
    }
    if let Some(timestamp) = embed.timestamp {
        builder = builder.timestamp(timestamp);
    }
    if let Some(author) = &embed.author {
        let mut create = CreateEmbedAuthor::new(&author.name);
        if let Some(url) = &author.url {
            create = create.url(url);
        }
        if let Some(icon_url) = &author.icon_url {
            create = create.icon_url(icon_url);
        }
        builder = builder.author(create);
    }
    if let Some(footer) = &embed.footer {
        let mut create = CreateEmbedFooter::new(&footer.text);
        if let Some(icon_url) = &footer.icon_url {
            create = create.icon_url(icon_url);
        }
        builder = builder.footer(create);
    }
    if let Some(image_url) = &embed.image_url {
        builder = builder.image(image_url);
    }
    if let Some(thumbnail_url) = &embed.thumbnail_url {
        builder = builder.thumbnail(thumbnail_url);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }

    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_channels_and_threads_are_targets() {
        assert_eq!(target_kind(ChannelType::Text), Some(TargetKind::Channel));
        assert_eq!(target_kind(ChannelType::News), Some(TargetKind::Channel));
        assert_eq!(target_kind(ChannelType::PublicThread), Some(TargetKind::Thread));
        assert_eq!(target_kind(ChannelType::PrivateThread), Some(TargetKind::Thread));
        assert_eq!(target_kind(ChannelType::NewsThread), Some(TargetKind::Thread));
    }

    #[test]
    fn test_primary_without_anything_left_is_skipped() {
        assert!(primary_message("", None, vec![], MentionPolicy::NONE).is_none());
    }

    #[test]
    fn test_primary_with_content_embed_or_file_is_sent() {
        let embed = RelayEmbed {
            title: Some("Patch notes".to_string()),
            ..Default::default()
        };
        let file = CreateAttachment::bytes(b"log".to_vec(), "log.txt");

        assert!(primary_message("hello", None, vec![], MentionPolicy::NONE).is_some());
        assert!(primary_message("", Some(&embed), vec![], MentionPolicy::NONE).is_some());
        assert!(primary_message("", None, vec![file], MentionPolicy::NONE).is_some());
    }

    #[test]
    fn test_relayed_messages_ping_nobody() {
        let mentions = serde_json::to_value(allowed_mentions(MentionPolicy::NONE)).unwrap();

        assert_eq!(
            mentions,
            serde_json::json!({
                "parse": [],
                "users": [],
                "roles": [],
                "replied_user": false
            })
        );
    }

    #[test]
    fn test_mention_policy_maps_to_parse_list() {
        let policy = MentionPolicy {
            everyone: false,
            users: true,
            roles: true,
        };
        let mentions = serde_json::to_value(allowed_mentions(policy)).unwrap();

        assert_eq!(mentions["parse"], serde_json::json!(["users", "roles"]));
        assert_eq!(mentions["replied_user"], serde_json::json!(false));
    }

    #[test]
    fn test_other_channel_kinds_are_rejected() {
        assert_eq!(target_kind(ChannelType::Voice), None);
        assert_eq!(target_kind(ChannelType::Category), None);
        assert_eq!(target_kind(ChannelType::Stage), None);
        assert_eq!(target_kind(ChannelType::Forum), None);
    }
}
