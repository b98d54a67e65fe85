//! Boundary between the forwarding engine and the chat platform.

use serenity::async_trait;
use serenity::model::id::ChannelId;

use crate::common::ForwardResult;
use crate::forward::emoji::EmojiCatalog;
use crate::forward::outbound::OutboundSend;

/// What a resolved target turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A standalone text or announcement channel.
    Channel,
    /// A thread under some channel.
    Thread,
}

/// Chat platform operations the engine relies on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolve a channel and check that it can receive relayed messages.
    ///
    /// Fails with `TargetUnresolvable` when the channel is gone or out of
    /// reach, and with `InvalidTarget` when it is neither a text channel nor
    /// a thread.
    async fn resolve_target(&self, channel_id: ChannelId) -> ForwardResult<TargetKind>;

    /// Emit one send to a channel.
    async fn send(&self, channel_id: ChannelId, send: &OutboundSend) -> ForwardResult<()>;

    /// Snapshot of the custom emoji on every guild the relay is in.
    fn emoji_catalog(&self) -> EmojiCatalog;
}

#[cfg(test)]
pub mod testing {
    //! In-memory transport that records every send.

    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::*;
    use crate::common::ForwardError;

    #[derive(Default)]
    pub struct RecordingTransport {
        targets: HashMap<ChannelId, TargetKind>,
        invalid: HashSet<ChannelId>,
        failing: Mutex<HashSet<&'static str>>,
        catalog: EmojiCatalog,
        pub sent: Mutex<Vec<(ChannelId, OutboundSend)>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_target(mut self, channel_id: u64, kind: TargetKind) -> Self {
            self.targets.insert(ChannelId::new(channel_id), kind);
            self
        }

        /// A channel that exists but cannot take relayed messages.
        pub fn with_invalid_target(mut self, channel_id: u64) -> Self {
            self.invalid.insert(ChannelId::new(channel_id));
            self
        }

        pub fn with_catalog(mut self, catalog: EmojiCatalog) -> Self {
            self.catalog = catalog;
            self
        }

        /// Make every send with this label fail.
        pub fn fail_sends(self, label: &'static str) -> Self {
            self.failing.lock().unwrap().insert(label);
            self
        }

        pub fn sends(&self) -> Vec<(ChannelId, OutboundSend)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn resolve_target(&self, channel_id: ChannelId) -> ForwardResult<TargetKind> {
            if self.invalid.contains(&channel_id) {
                return Err(ForwardError::InvalidTarget {
                    channel_id,
                    kind: "voice".to_string(),
                });
            }
            self.targets
                .get(&channel_id)
                .copied()
                .ok_or(ForwardError::TargetUnresolvable { channel_id })
        }

        async fn send(&self, channel_id: ChannelId, send: &OutboundSend) -> ForwardResult<()> {
            if self.failing.lock().unwrap().contains(send.label()) {
                return Err(ForwardError::SendFailed {
                    channel_id,
                    message: "Missing Permissions".to_string(),
                });
            }
            self.sent.lock().unwrap().push((channel_id, send.clone()));
            Ok(())
        }

        fn emoji_catalog(&self) -> EmojiCatalog {
            self.catalog.clone()
        }
    }
}
