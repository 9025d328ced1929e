//! Acting user extractor
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user's numeric id in `X-User-Id`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use super::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Id of the user performing the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub i32);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Missing X-User-Id header"))?;

        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .map(ActingUser)
            .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Invalid X-User-Id header"))
    }
}
