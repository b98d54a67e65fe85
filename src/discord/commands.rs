//! Route admin commands (!source, !target, !removesource, etc).
//!
//! Handles command parsing and execution against the route store.

use std::sync::Arc;

use serenity::model::channel::Message;
use serenity::model::id::ChannelId;
use serenity::model::mention::Mentionable;
use serenity::prelude::*;
use tracing::{debug, error, info};

use crate::common::StoreError;
use crate::forward::transport::Transport;
use crate::store::{run_blocking, Route, RouteStore, UpsertOutcome};

/// Discord rejects messages longer than this.
const MAX_REPLY_LEN: usize = 2000;

/// Commands that mutate or inspect the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Register a source channel (!source #channel).
    AddSource(ChannelId),
    /// List all source channels (!listsources).
    ListSources,
    /// Pair a source with a target (!target #source #target).
    Pair { source: ChannelId, target: ChannelId },
    /// List source-target pairs (!sourcepair).
    ListPairs,
    /// Remove a source channel (!removesource #channel).
    RemoveSource(ChannelId),
    /// Show usage (!forwardhelp).
    Help,
}

/// Result of parsing a prefixed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Command(AdminCommand),
    /// A known command with bad arguments; reply with this usage line.
    Usage(String),
    /// Not one of ours.
    Unknown,
}

/// Route admin command handler.
pub struct RouteAdmin {
    store: Arc<dyn RouteStore>,
    prefix: String,
    /// Channels where commands are accepted (None = all channels).
    command_channels: Option<Vec<ChannelId>>,
}

impl RouteAdmin {
    pub fn new(
        store: Arc<dyn RouteStore>,
        prefix: impl Into<String>,
        command_channels: Option<Vec<ChannelId>>,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            command_channels,
        }
    }

    /// Whether commands are accepted in this channel.
    pub fn accepts_channel(&self, channel_id: ChannelId) -> bool {
        self.command_channels
            .as_ref()
            .map_or(true, |channels| channels.contains(&channel_id))
    }

    /// Parse a command message.
    pub fn parse(&self, content: &str) -> Parsed {
        let Some(body) = content.strip_prefix(self.prefix.as_str()) else {
            return Parsed::Unknown;
        };

        let mut parts = body.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        debug!("Processing command: {} with args: {:?}", command, args);

        let p = &self.prefix;
        match command.as_str() {
            "source" => match args.as_slice() {
                [channel] => parse_channel(channel)
                    .map(AdminCommand::AddSource)
                    .map_or_else(|| usage(format!("{p}source #channel")), Parsed::Command),
                _ => usage(format!("{p}source #channel")),
            },
            "listsources" => Parsed::Command(AdminCommand::ListSources),
            "target" => match args.as_slice() {
                [source, target] => match (parse_channel(source), parse_channel(target)) {
                    (Some(source), Some(target)) => {
                        Parsed::Command(AdminCommand::Pair { source, target })
                    }
                    _ => Parsed::Usage(
                        "Invalid source or target. Please mention valid channels or threads."
                            .to_string(),
                    ),
                },
                _ => usage(format!("{p}target #source #target")),
            },
            "sourcepair" => Parsed::Command(AdminCommand::ListPairs),
            "removesource" => match args.as_slice() {
                [channel] => parse_channel(channel)
                    .map(AdminCommand::RemoveSource)
                    .map_or_else(|| usage(format!("{p}removesource #channel")), Parsed::Command),
                _ => usage(format!("{p}removesource #channel")),
            },
            "forwardhelp" => Parsed::Command(AdminCommand::Help),
            _ => Parsed::Unknown,
        }
    }

    /// Run a command and produce the reply text.
    pub async fn execute(&self, transport: &dyn Transport, command: AdminCommand) -> String {
        let result = match command {
            AdminCommand::AddSource(channel) => self.add_source(channel).await,
            AdminCommand::ListSources => self.list_sources().await,
            AdminCommand::Pair { source, target } => self.pair(transport, source, target).await,
            AdminCommand::ListPairs => self.list_pairs().await,
            AdminCommand::RemoveSource(channel) => self.remove_source(channel).await,
            AdminCommand::Help => Ok(self.help_text()),
        };

        result.unwrap_or_else(|e| {
            error!("Route store error: {}", e);
            "Error: could not access the route database.".to_string()
        })
    }

    /// Handle a command message from Discord.
    ///
    /// Messages outside the command channels and unknown commands are ignored.
    pub async fn handle(
        &self,
        ctx: &Context,
        transport: &dyn Transport,
        msg: &Message,
    ) -> anyhow::Result<()> {
        if !self.accepts_channel(msg.channel_id) {
            debug!("Ignoring command in channel {}", msg.channel_id);
            return Ok(());
        }

        let reply = match self.parse(msg.content.trim()) {
            Parsed::Command(command) => {
                info!("{:?} command from {}", command, msg.author.name);
                self.execute(transport, command).await
            }
            Parsed::Usage(text) => text,
            Parsed::Unknown => return Ok(()),
        };

        for chunk in split_reply(&reply, MAX_REPLY_LEN) {
            msg.channel_id.say(&ctx.http, chunk).await?;
        }
        Ok(())
    }

    async fn add_source(&self, channel: ChannelId) -> Result<String, StoreError> {
        let outcome = run_blocking(&self.store, move |store| store.upsert_source(channel)).await?;
        Ok(match outcome {
            UpsertOutcome::Created => {
                info!("Added source channel {}", channel);
                format!("Source channel {} added.", channel.mention())
            }
            UpsertOutcome::AlreadyExists => {
                format!("Source channel {} is already added.", channel.mention())
            }
        })
    }

    async fn list_sources(&self) -> Result<String, StoreError> {
        let routes = run_blocking(&self.store, |store| store.list()).await?;
        if routes.is_empty() {
            return Ok("No source channels found.".to_string());
        }

        let lines: Vec<String> = routes
            .iter()
            .map(|route| format!("Source Channel: {}", route.source.mention()))
            .collect();
        Ok(format!("Source channels:\n{}", lines.join("\n")))
    }

    async fn pair(
        &self,
        transport: &dyn Transport,
        source: ChannelId,
        target: ChannelId,
    ) -> Result<String, StoreError> {
        for channel in [source, target] {
            if let Err(e) = transport.resolve_target(channel).await {
                debug!("Rejecting pairing: {}", e);
                return Ok(
                    "Invalid source or target. Please mention valid channels or threads."
                        .to_string(),
                );
            }
        }

        match run_blocking(&self.store, move |store| store.set_target(source, target)).await {
            Ok(()) => {
                info!("Paired source {} with target {}", source, target);
                Ok(format!(
                    "Source {} paired with target {}.",
                    source.mention(),
                    target.mention()
                ))
            }
            Err(StoreError::UnknownSource { .. }) => Ok(format!(
                "Source channel {} is not a source. Add it first with `{}source`.",
                source.mention(),
                self.prefix
            )),
            Err(e) => Err(e),
        }
    }

    async fn list_pairs(&self) -> Result<String, StoreError> {
        let routes = run_blocking(&self.store, |store| store.list_paired()).await?;
        if routes.is_empty() {
            return Ok("No source-target pairs found.".to_string());
        }

        let lines: Vec<String> = routes.iter().filter_map(format_pair).collect();
        Ok(format!("Source-Target pairs:\n{}", lines.join("\n")))
    }

    async fn remove_source(&self, channel: ChannelId) -> Result<String, StoreError> {
        match run_blocking(&self.store, move |store| store.remove(channel)).await {
            Ok(()) => {
                info!("Removed source channel {}", channel);
                Ok(format!(
                    "Source channel {} has been removed.",
                    channel.mention()
                ))
            }
            Err(StoreError::UnknownSource { .. }) => {
                Ok(format!("Source channel {} not found.", channel.mention()))
            }
            Err(e) => Err(e),
        }
    }

    fn help_text(&self) -> String {
        let p = &self.prefix;
        format!(
            "**Commands:**\n\
             • `{p}source #channel` - Add a source channel\n\
             • `{p}listsources` - List all source channels\n\
             • `{p}target #source #target` - Pair a source channel or thread with a \
             target channel or thread\n\
             • `{p}sourcepair` - List source-target pairs\n\
             • `{p}removesource #channel` - Remove a source channel\n\
             • `{p}forwardhelp` - Show this help message"
        )
    }
}

fn usage(line: String) -> Parsed {
    Parsed::Usage(format!("Usage: `{}`", line))
}

fn format_pair(route: &Route) -> Option<String> {
    route.target.map(|target| {
        format!(
            "Source: {} -> Target: {}",
            route.source.mention(),
            target.mention()
        )
    })
}

/// Parse a `<#id>` channel mention or a raw channel id.
fn parse_channel(arg: &str) -> Option<ChannelId> {
    let raw = arg
        .strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(arg);

    raw.parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId::new)
}

/// Split a reply into chunks of at most `limit` bytes, breaking at line ends
/// and hard-splitting lines that are too long on their own.
fn split_reply(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines().flat_map(|line| split_line(line, limit)) {
        if !current.is_empty() && current.len() + 1 + line.len() > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Cut a line into pieces of at most `limit` bytes on char boundaries.
fn split_line(line: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (idx, ch) in line.char_indices() {
        if idx > start && idx + ch.len_utf8() - start > limit {
            pieces.push(&line[start..idx]);
            start = idx;
        }
    }
    pieces.push(&line[start..]);

    pieces
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::forward::transport::testing::RecordingTransport;
    use crate::forward::transport::TargetKind;
    use crate::store::SqliteRouteStore;

    fn id(value: u64) -> ChannelId {
        ChannelId::new(value)
    }

    fn admin() -> (RouteAdmin, Arc<dyn RouteStore>) {
        let store: Arc<dyn RouteStore> =
            Arc::new(SqliteRouteStore::open(Path::new(":memory:")).unwrap());
        (RouteAdmin::new(store.clone(), "!", None), store)
    }

    fn transport() -> RecordingTransport {
        RecordingTransport::new()
            .with_target(100, TargetKind::Channel)
            .with_target(200, TargetKind::Thread)
    }

    #[test]
    fn test_parse_commands() {
        let (admin, _) = admin();

        assert_eq!(
            admin.parse("!source <#100>"),
            Parsed::Command(AdminCommand::AddSource(id(100)))
        );
        assert_eq!(
            admin.parse("!target <#100> 200"),
            Parsed::Command(AdminCommand::Pair {
                source: id(100),
                target: id(200)
            })
        );
        assert_eq!(
            admin.parse("!REMOVESOURCE <#100>"),
            Parsed::Command(AdminCommand::RemoveSource(id(100)))
        );
        assert_eq!(admin.parse("!listsources"), Parsed::Command(AdminCommand::ListSources));
        assert_eq!(admin.parse("!sourcepair"), Parsed::Command(AdminCommand::ListPairs));
        assert_eq!(admin.parse("!forwardhelp"), Parsed::Command(AdminCommand::Help));
        assert_eq!(admin.parse("!who"), Parsed::Unknown);
        assert_eq!(admin.parse("hello"), Parsed::Unknown);
    }

    #[test]
    fn test_parse_bad_arguments() {
        let (admin, _) = admin();

        assert!(matches!(admin.parse("!source"), Parsed::Usage(_)));
        assert!(matches!(admin.parse("!source general"), Parsed::Usage(_)));
        assert!(matches!(admin.parse("!target <#100>"), Parsed::Usage(_)));
        assert!(matches!(admin.parse("!target <#100> <@200>"), Parsed::Usage(_)));
        assert!(matches!(admin.parse("!removesource <#0>"), Parsed::Usage(_)));
    }

    #[test]
    fn test_custom_prefix() {
        let store: Arc<dyn RouteStore> =
            Arc::new(SqliteRouteStore::open(Path::new(":memory:")).unwrap());
        let admin = RouteAdmin::new(store, "fwd!", None);

        assert_eq!(admin.parse("fwd!sourcepair"), Parsed::Command(AdminCommand::ListPairs));
        assert_eq!(admin.parse("!sourcepair"), Parsed::Unknown);
        assert!(admin.help_text().contains("`fwd!source #channel`"));
    }

    #[test]
    fn test_command_channel_restriction() {
        let store: Arc<dyn RouteStore> =
            Arc::new(SqliteRouteStore::open(Path::new(":memory:")).unwrap());
        let open = RouteAdmin::new(store.clone(), "!", None);
        let restricted = RouteAdmin::new(store, "!", Some(vec![id(5)]));

        assert!(open.accepts_channel(id(9)));
        assert!(restricted.accepts_channel(id(5)));
        assert!(!restricted.accepts_channel(id(9)));
    }

    #[tokio::test]
    async fn test_add_list_pair_remove_flow() {
        let (admin, store) = admin();
        let transport = transport();

        let reply = admin.execute(&transport, AdminCommand::AddSource(id(100))).await;
        assert_eq!(reply, "Source channel <#100> added.");

        let reply = admin.execute(&transport, AdminCommand::AddSource(id(100))).await;
        assert_eq!(reply, "Source channel <#100> is already added.");

        let reply = admin.execute(&transport, AdminCommand::ListSources).await;
        assert_eq!(reply, "Source channels:\nSource Channel: <#100>");

        let reply = admin.execute(&transport, AdminCommand::ListPairs).await;
        assert_eq!(reply, "No source-target pairs found.");

        let reply = admin
            .execute(
                &transport,
                AdminCommand::Pair {
                    source: id(100),
                    target: id(200),
                },
            )
            .await;
        assert_eq!(reply, "Source <#100> paired with target <#200>.");
        assert_eq!(store.get(id(100)).unwrap().unwrap().target, Some(id(200)));

        let reply = admin.execute(&transport, AdminCommand::ListPairs).await;
        assert_eq!(reply, "Source-Target pairs:\nSource: <#100> -> Target: <#200>");

        let reply = admin.execute(&transport, AdminCommand::RemoveSource(id(100))).await;
        assert_eq!(reply, "Source channel <#100> has been removed.");

        let reply = admin.execute(&transport, AdminCommand::RemoveSource(id(100))).await;
        assert_eq!(reply, "Source channel <#100> not found.");

        let reply = admin.execute(&transport, AdminCommand::ListSources).await;
        assert_eq!(reply, "No source channels found.");
    }

    #[tokio::test]
    async fn test_pair_unknown_source_creates_nothing() {
        let (admin, store) = admin();
        let transport = transport();

        let reply = admin
            .execute(
                &transport,
                AdminCommand::Pair {
                    source: id(100),
                    target: id(200),
                },
            )
            .await;

        assert!(reply.contains("is not a source"));
        assert!(store.get(id(100)).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pair_rejects_unresolvable_channels() {
        let (admin, store) = admin();
        let transport = transport().with_invalid_target(300);
        store.upsert_source(id(100)).unwrap();

        for target in [id(300), id(400)] {
            let reply = admin
                .execute(
                    &transport,
                    AdminCommand::Pair {
                        source: id(100),
                        target,
                    },
                )
                .await;
            assert!(reply.starts_with("Invalid source or target"));
        }
        assert_eq!(store.get(id(100)).unwrap().unwrap().target, None);
    }

    #[test]
    fn test_split_reply() {
        assert_eq!(split_reply("short", 2000), vec!["short".to_string()]);

        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(
            split_reply(text, 9),
            vec!["aaaa\nbbbb".to_string(), "cccc".to_string()]
        );
        assert!(split_reply("", 10).is_empty());
    }

    #[test]
    fn test_split_reply_hard_splits_long_lines() {
        let long = "x".repeat(4500);
        let text = format!("header\n{}\nfooter", long);

        let chunks = split_reply(&text, 2000);

        assert!(chunks.iter().all(|chunk| chunk.len() <= 2000));
        assert_eq!(chunks.concat().replace('\n', ""), text.replace('\n', ""));
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn test_split_line_keeps_char_boundaries() {
        let pieces = split_line("ééééé", 4);

        assert_eq!(pieces, vec!["éé", "éé", "é"]);
    }
}
