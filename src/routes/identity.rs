use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the owner namespace supplied by the identity provider.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Owner of the request, read from [`OWNER_HEADER`].
#[derive(Debug, Clone)]
pub struct OwnerId(pub String);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Unauthorized(format!("missing `{OWNER_HEADER}` header")))?;

        Ok(OwnerId(owner.to_string()))
    }
}
