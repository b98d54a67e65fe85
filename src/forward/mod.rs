//! The forwarding engine.
//!
//! ## Module Structure
//!
//! - `message`: Transport-neutral inbound message (`InboundMessage`, `RelayEmbed`)
//! - `emoji`: Custom emoji repair (`EmojiResolver`, `EmojiCatalog`)
//! - `outbound`: Send sequence reconstruction (`ContentReconstructor`)
//! - `dispatcher`: Per-message routing decision (`Dispatcher`)
//! - `transport`: Platform boundary (`Transport`)

pub mod dispatcher;
pub mod emoji;
pub mod message;
pub mod outbound;
pub mod transport;

pub use dispatcher::{Disposition, Dispatcher};
