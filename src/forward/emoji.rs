//! Custom emoji repair.
//!
//! A custom emoji reference (`<:name:id>` or `<a:name:id>`) only renders where
//! the referenced emoji is available. Before a message is relayed every
//! reference is either kept, re-pointed at a same-named emoji from a guild the
//! relay can see, or degraded to plain `:name:` text.

use std::collections::HashMap;

use fancy_regex::{Captures, Regex};
use serenity::model::id::{EmojiId, GuildId};
use tracing::debug;

/// A custom emoji registered on a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEmoji {
    pub id: EmojiId,
    pub name: String,
    pub animated: bool,
}

impl CatalogEmoji {
    /// Render as a message reference.
    pub fn reference(&self) -> String {
        if self.animated {
            format!("<a:{}:{}>", self.name, self.id)
        } else {
            format!("<:{}:{}>", self.name, self.id)
        }
    }
}

/// The custom emoji of one guild, in ascending id order.
#[derive(Debug, Clone)]
pub struct GuildEmojis {
    pub guild_id: GuildId,
    emojis: Vec<CatalogEmoji>,
}

impl GuildEmojis {
    pub fn new(guild_id: GuildId, mut emojis: Vec<CatalogEmoji>) -> Self {
        emojis.sort_by_key(|emoji| emoji.id);
        Self { guild_id, emojis }
    }

    /// Whether this guild has an emoji with exactly this name and id.
    fn contains(&self, name: &str, id: Option<u64>) -> bool {
        id.is_some_and(|id| {
            self.emojis
                .iter()
                .any(|emoji| emoji.name == name && emoji.id.get() == id)
        })
    }

    fn find_by_name(&self, name: &str) -> Option<&CatalogEmoji> {
        self.emojis.iter().find(|emoji| emoji.name == name)
    }
}

/// Snapshot of every custom emoji the relay can see, across all its guilds.
///
/// Guilds are kept in ascending id order so lookups are repeatable.
#[derive(Debug, Clone, Default)]
pub struct EmojiCatalog {
    guilds: Vec<GuildEmojis>,
}

impl EmojiCatalog {
    pub fn new(mut guilds: Vec<GuildEmojis>) -> Self {
        guilds.sort_by_key(|guild| guild.guild_id);
        Self { guilds }
    }

    pub fn guild(&self, guild_id: GuildId) -> Option<&GuildEmojis> {
        self.guilds.iter().find(|guild| guild.guild_id == guild_id)
    }

    /// First emoji with this name, searching guilds in order.
    pub fn find_by_name(&self, name: &str) -> Option<&CatalogEmoji> {
        self.guilds.iter().find_map(|guild| guild.find_by_name(name))
    }

    pub fn emoji_count(&self) -> usize {
        self.guilds.iter().map(|guild| guild.emojis.len()).sum()
    }
}

/// Rewrites custom emoji references so they stay renderable after relay.
#[derive(Debug, Clone)]
pub struct EmojiResolver {
    /// Pattern for Discord custom emojis (<:name:id> or <a:name:id>).
    emoji_pattern: Regex,
}

impl Default for EmojiResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EmojiResolver {
    pub fn new() -> Self {
        Self {
            emoji_pattern: Regex::new(r"<(a?):([a-zA-Z0-9_]+):([0-9]+)>").unwrap(),
        }
    }

    /// Rewrite every custom emoji reference in `text`.
    ///
    /// - A reference whose name and id are registered on the originating guild
    ///   is kept byte for byte.
    /// - Otherwise the first same-named emoji in `visible` replaces it, using
    ///   that emoji's own id and animated flag.
    /// - With no match anywhere it becomes `:name:`.
    ///
    /// All other text is left untouched.
    pub fn rewrite(
        &self,
        text: &str,
        originating: Option<&GuildEmojis>,
        visible: &EmojiCatalog,
    ) -> String {
        // Decisions per distinct (name, id) reference, static and animated alike.
        let mut decisions: HashMap<(String, String), Option<String>> = HashMap::new();

        self.emoji_pattern
            .replace_all(text, |caps: &Captures| -> String {
                let name = &caps[2];
                let raw_id = &caps[3];

                let decision = decisions
                    .entry((name.to_string(), raw_id.to_string()))
                    .or_insert_with(|| resolve_reference(name, raw_id, originating, visible));

                match decision {
                    Some(replacement) => replacement.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Decide what a single reference becomes. `None` keeps it as written.
fn resolve_reference(
    name: &str,
    raw_id: &str,
    originating: Option<&GuildEmojis>,
    visible: &EmojiCatalog,
) -> Option<String> {
    // Ids that overflow or are zero cannot name a live emoji.
    let id = raw_id.parse::<u64>().ok().filter(|id| *id != 0);

    if originating.is_some_and(|guild| guild.contains(name, id)) {
        return None;
    }

    match visible.find_by_name(name) {
        Some(emoji) => {
            debug!("Emoji :{}:{} replaced with {}", name, raw_id, emoji.reference());
            Some(emoji.reference())
        }
        None => {
            debug!("Emoji :{}:{} not visible anywhere, using text", name, raw_id);
            Some(format!(":{}:", name))
        }
    }
}
