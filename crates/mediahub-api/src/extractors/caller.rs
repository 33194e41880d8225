//! `AuthUser` extractor: reads the identity asserted by the upstream auth layer.
//!
//! Authentication happens in front of this service. The gateway forwards the
//! verified user as `X-User-Id` (UUID) and `X-Username`; requests without
//! them are refused.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use mediahub_core::error::AppError;
use mediahub_core::types::UserId;
use mediahub_service::Caller;

use crate::error::ApiError;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller's username.
pub const USERNAME_HEADER: &str = "x-username";

/// Extracted caller identity available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Caller);

impl AuthUser {
    /// Returns the inner `Caller`.
    pub fn caller(&self) -> &Caller {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = Caller;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_id = header(USER_ID_HEADER)
            .ok_or_else(|| AppError::authorization("Missing caller identity"))?
            .parse::<UserId>()
            .map_err(|_| AppError::authorization("Invalid caller identity"))?;

        let username = header(USERNAME_HEADER)
            .ok_or_else(|| AppError::authorization("Missing caller identity"))?
            .to_string();

        Ok(AuthUser(Caller::new(user_id, username)))
    }
}
