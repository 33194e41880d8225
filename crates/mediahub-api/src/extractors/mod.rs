//! Custom Axum extractors.

pub mod caller;
pub mod json;
pub mod path;

pub use caller::AuthUser;
pub use json::ValidJson;
pub use path::parse_id;
