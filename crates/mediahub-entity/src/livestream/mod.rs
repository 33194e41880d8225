//! Livestream keys and recordings.

pub mod key;
pub mod model;

pub use key::{LivestreamKey, generate_stream_key};
pub use model::{CreateLivestream, Livestream};
