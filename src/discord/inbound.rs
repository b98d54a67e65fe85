//! Conversion from serenity message models to the forwarding engine's types.

use serenity::model::channel::{Embed, Message};

use crate::forward::message::{
    AttachmentRef, EmbedAuthorRef, EmbedFieldRef, EmbedFooterRef, InboundMessage, RelayEmbed,
};

/// Capture everything the engine needs from a gateway message.
pub fn inbound_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        id: msg.id,
        channel_id: msg.channel_id,
        guild_id: msg.guild_id,
        author_id: msg.author.id,
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        embeds: msg.embeds.iter().map(relay_embed).collect(),
        attachments: msg
            .attachments
            .iter()
            .map(|attachment| AttachmentRef {
                filename: attachment.filename.clone(),
                url: attachment.url.clone(),
            })
            .collect(),
        stickers: msg.sticker_items.iter().map(|sticker| sticker.id).collect(),
    }
}

/// Keep the parts of an embed a bot is allowed to send.
pub fn relay_embed(embed: &Embed) -> RelayEmbed {
    RelayEmbed {
        title: embed.title.clone(),
        description: embed.description.clone(),
        url: embed.url.clone(),
        colour: embed.colour.map(|colour| colour.0),
        timestamp: embed.timestamp,
        author: embed.author.as_ref().map(|author| EmbedAuthorRef {
            name: author.name.clone(),
            url: author.url.clone(),
            icon_url: author.icon_url.clone(),
        }),
        footer: embed.footer.as_ref().map(|footer| EmbedFooterRef {
            text: footer.text.clone(),
            icon_url: footer.icon_url.clone(),
        }),
        image_url: embed.image.as_ref().map(|image| image.url.clone()),
        thumbnail_url: embed.thumbnail.as_ref().map(|thumbnail| thumbnail.url.clone()),
        fields: embed
            .fields
            .iter()
            .map(|field| EmbedFieldRef {
                name: field.name.clone(),
                value: field.value.clone(),
                inline: field.inline,
            })
            .collect(),
    }
}
