//! Outbound payload reconstruction.
//!
//! Turns an inbound message (with its emoji already repaired) into the ordered
//! list of sends that reproduce it in the target channel.

use serenity::model::id::StickerId;

use crate::forward::message::{AttachmentRef, RelayEmbed};

/// Which mention kinds a send may ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentionPolicy {
    pub everyone: bool,
    pub users: bool,
    pub roles: bool,
}

impl MentionPolicy {
    /// Relayed content never pings anyone on the target side.
    pub const NONE: Self = Self {
        everyone: false,
        users: false,
        roles: false,
    };
}

/// One message to emit to the target.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundSend {
    /// Message text with the first embed inline and every attachment.
    Primary {
        content: String,
        embed: Option<RelayEmbed>,
        attachments: Vec<AttachmentRef>,
        mentions: MentionPolicy,
    },
    /// A sticker on its own.
    Sticker(StickerId),
    /// An embed on its own.
    Embed(RelayEmbed),
}

impl OutboundSend {
    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Primary { .. } => "primary",
            Self::Sticker(_) => "sticker",
            Self::Embed(_) => "embed",
        }
    }
}

/// Builds the sequence of sends for a relayed message.
#[derive(Debug, Clone, Copy)]
pub struct ContentReconstructor {
    /// Re-send every embed after the primary send, including the inline one.
    resend_embeds: bool,
}

impl ContentReconstructor {
    pub fn new(resend_embeds: bool) -> Self {
        Self { resend_embeds }
    }

    /// Build sends in emission order: primary, one per sticker, then one per
    /// embed when embed re-sending is enabled.
    ///
    /// The primary send is left out when it would be empty (a sticker-only
    /// message, for instance), since the platform rejects empty messages.
    pub fn build(
        &self,
        content: String,
        embeds: Vec<RelayEmbed>,
        attachments: Vec<AttachmentRef>,
        stickers: &[StickerId],
    ) -> Vec<OutboundSend> {
        let mut sends = Vec::with_capacity(1 + stickers.len() + embeds.len());

        let embed = primary_embed(&embeds);
        if !content.is_empty() || embed.is_some() || !attachments.is_empty() {
            sends.push(OutboundSend::Primary {
                content,
                embed,
                attachments,
                mentions: MentionPolicy::NONE,
            });
        }

        sends.extend(stickers.iter().copied().map(OutboundSend::Sticker));

        if self.resend_embeds {
            sends.extend(all_embeds(embeds));
        }

        sends
    }
}

/// The embed carried inline by the primary send.
fn primary_embed(embeds: &[RelayEmbed]) -> Option<RelayEmbed> {
    embeds.first().cloned()
}

/// Every embed as its own follow-up send.
fn all_embeds(embeds: Vec<RelayEmbed>) -> impl Iterator<Item = OutboundSend> {
    embeds.into_iter().map(OutboundSend::Embed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed(title: &str) -> RelayEmbed {
        RelayEmbed {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn attachment(name: &str) -> AttachmentRef {
        AttachmentRef {
            filename: name.to_string(),
            url: format!("https://cdn.example.com/{}", name),
        }
    }

    #[test]
    fn test_two_embeds_and_a_sticker() {
        let reconstructor = ContentReconstructor::new(true);
        let sends = reconstructor.build(
            "hello".to_string(),
            vec![embed("one"), embed("two")],
            vec![],
            &[StickerId::new(7)],
        );

        assert_eq!(
            sends,
            vec![
                OutboundSend::Primary {
                    content: "hello".to_string(),
                    embed: Some(embed("one")),
                    attachments: vec![],
                    mentions: MentionPolicy::NONE,
                },
                OutboundSend::Sticker(StickerId::new(7)),
                OutboundSend::Embed(embed("one")),
                OutboundSend::Embed(embed("two")),
            ]
        );
    }

    #[test]
    fn test_without_embed_resend() {
        let reconstructor = ContentReconstructor::new(false);
        let sends = reconstructor.build(
            String::new(),
            vec![embed("one"), embed("two")],
            vec![],
            &[],
        );

        assert_eq!(sends.len(), 1);
        assert!(matches!(
            &sends[0],
            OutboundSend::Primary { embed: Some(e), .. } if e == &embed("one")
        ));
    }

    #[test]
    fn test_attachments_ride_on_primary() {
        let reconstructor = ContentReconstructor::new(true);
        let sends = reconstructor.build(
            String::new(),
            vec![],
            vec![attachment("a.png"), attachment("b.txt")],
            &[],
        );

        assert_eq!(sends.len(), 1);
        match &sends[0] {
            OutboundSend::Primary {
                content,
                embed,
                attachments,
                ..
            } => {
                assert!(content.is_empty());
                assert!(embed.is_none());
                assert_eq!(attachments.len(), 2);
            }
            other => panic!("expected primary send, got {:?}", other),
        }
    }

    #[test]
    fn test_sticker_only_message_skips_empty_primary() {
        let reconstructor = ContentReconstructor::new(true);
        let sends = reconstructor.build(
            String::new(),
            vec![],
            vec![],
            &[StickerId::new(1), StickerId::new(2)],
        );

        assert_eq!(
            sends,
            vec![
                OutboundSend::Sticker(StickerId::new(1)),
                OutboundSend::Sticker(StickerId::new(2)),
            ]
        );
    }

    #[test]
    fn test_primary_suppresses_all_mentions() {
        let reconstructor = ContentReconstructor::new(true);
        let sends = reconstructor.build("@everyone look".to_string(), vec![], vec![], &[]);

        match &sends[0] {
            OutboundSend::Primary { mentions, .. } => {
                assert!(!mentions.everyone);
                assert!(!mentions.users);
                assert!(!mentions.roles);
            }
            other => panic!("expected primary send, got {:?}", other),
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(OutboundSend::Sticker(StickerId::new(1)).label(), "sticker");
        assert_eq!(OutboundSend::Embed(RelayEmbed::default()).label(), "embed");
    }
}
