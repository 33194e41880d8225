//! Chunked upload persistence and assembly.

pub mod assembler;
pub mod store;

pub use assembler::ChunkAssembler;
pub use store::{ChunkFile, ChunkStore};
