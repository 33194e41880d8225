//! # mediahub-core
//!
//! Core crate for MediaHub. Contains configuration schemas, typed
//! identifiers, and the unified error system shared by the coordinator
//! and the worker nodes.
//!
//! This crate has **no** internal dependencies on other MediaHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
