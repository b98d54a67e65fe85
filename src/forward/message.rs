//! Transport-neutral view of an inbound message.
//!
//! The Discord layer converts serenity models into these types so the
//! forwarding engine can be driven without a gateway connection.

use serenity::model::id::{ChannelId, GuildId, MessageId, StickerId, UserId};
use serenity::model::Timestamp;

/// A message observed in a channel the relay can read.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    /// Originating guild; `None` for direct messages.
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
    pub author_is_bot: bool,
    pub content: String,
    pub embeds: Vec<RelayEmbed>,
    pub attachments: Vec<AttachmentRef>,
    pub stickers: Vec<StickerId>,
}

/// An uploaded file, referenced by its CDN URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub url: String,
}

/// The sendable parts of a rich embed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelayEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub colour: Option<u32>,
    pub timestamp: Option<Timestamp>,
    pub author: Option<EmbedAuthorRef>,
    pub footer: Option<EmbedFooterRef>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub fields: Vec<EmbedFieldRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAuthorRef {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedFooterRef {
    pub text: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedFieldRef {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl RelayEmbed {
    /// Apply `rewrite` to every text part that can carry emoji references:
    /// title, description, each field name and value, and the footer text.
    ///
    /// Each part is rewritten independently.
    pub fn map_text(mut self, mut rewrite: impl FnMut(&str) -> String) -> Self {
        if let Some(title) = self.title.as_mut() {
            *title = rewrite(title);
        }
        if let Some(description) = self.description.as_mut() {
            *description = rewrite(description);
        }
        for field in &mut self.fields {
            field.name = rewrite(&field.name);
            field.value = rewrite(&field.value);
        }
        if let Some(footer) = self.footer.as_mut() {
            footer.text = rewrite(&footer.text);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_text_touches_only_text_parts() {
        let embed = RelayEmbed {
            title: Some("title".to_string()),
            description: Some("description".to_string()),
            url: Some("https://example.com/a".to_string()),
            author: Some(EmbedAuthorRef {
                name: "author".to_string(),
                url: None,
                icon_url: None,
            }),
            footer: Some(EmbedFooterRef {
                text: "footer".to_string(),
                icon_url: Some("https://example.com/icon.png".to_string()),
            }),
            fields: vec![EmbedFieldRef {
                name: "name".to_string(),
                value: "value".to_string(),
                inline: true,
            }],
            ..Default::default()
        };

        let mapped = embed.map_text(|text| text.to_uppercase());

        assert_eq!(mapped.title.as_deref(), Some("TITLE"));
        assert_eq!(mapped.description.as_deref(), Some("DESCRIPTION"));
        assert_eq!(mapped.fields[0].name, "NAME");
        assert_eq!(mapped.fields[0].value, "VALUE");
        assert_eq!(mapped.footer.as_ref().map(|f| f.text.as_str()), Some("FOOTER"));
        // Not emoji-bearing text
        assert_eq!(mapped.url.as_deref(), Some("https://example.com/a"));
        assert_eq!(mapped.author.map(|a| a.name), Some("author".to_string()));
    }
}
