//! # mediahub-storage
//!
//! Local filesystem handling for a MediaHub node: the directory layout
//! under the storage root, chunk persistence and assembly, and the
//! translation of paths reported by the streaming server.

pub mod chunked;
pub mod fs;
pub mod layout;
pub mod sandbox;

pub use chunked::{ChunkAssembler, ChunkFile, ChunkStore};
pub use layout::StorageLayout;
pub use sandbox::SandboxPathMapper;
