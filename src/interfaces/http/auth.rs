use super::error::ApiError;
use crate::domain::ids::UserId;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Header carrying the authenticated caller, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?;
        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(|id| Self(UserId(id)))
            .ok_or_else(|| ApiError::unauthorized("Malformed X-User-Id header"))
    }
}
