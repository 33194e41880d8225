//! HTTP request handlers organized by domain.

pub mod chunk;
pub mod health;
pub mod hook;
pub mod livestream;
pub mod server;
pub mod task;
pub mod upload;
pub mod video;
