//! Livestream keys, recordings and the streaming server's webhooks.

pub mod endpoints;
pub mod hooks;
pub mod keys;

pub use endpoints::StreamEndpoints;
pub use hooks::{DvrOutcome, HookReply, LivestreamHookService};
pub use keys::{ChannelState, KeyOverview, LivestreamKeyService, StreamInfo};
