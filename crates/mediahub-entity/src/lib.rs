//! # mediahub-entity
//!
//! Domain entity models for MediaHub. Every struct in this crate
//! represents a database table row, a domain value object, or a task
//! payload travelling over the queue. Database entities derive
//! `sqlx::FromRow`.

pub mod livestream;
pub mod task;
pub mod upload;
pub mod video;
pub mod worker;
