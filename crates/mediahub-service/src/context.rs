//! Identity of the user on whose behalf a service call runs.

use serde::{Deserialize, Serialize};

use mediahub_core::types::UserId;

/// The authenticated caller, as asserted by the upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// User id.
    pub user_id: UserId,
    /// Username; owns storage paths and media records.
    pub username: String,
}

impl Caller {
    /// Creates a caller context.
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}
