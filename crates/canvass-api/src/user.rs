//! The requesting user, as asserted by the authentication layer in front of
//! this router.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_HEADER: &str = "x-canvass-user";

/// The user id from [`USER_HEADER`], or `None` for anonymous requests.
#[derive(Debug, Clone, Copy)]
pub struct RequestUser(pub Option<i64>);

impl<S: Send + Sync> FromRequestParts<S> for RequestUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(USER_HEADER) else {
      return Ok(Self(None));
    };

    value
      .to_str()
      .ok()
      .and_then(|v| v.trim().parse().ok())
      .map(|id| Self(Some(id)))
      .ok_or_else(|| {
        ApiError::BadRequest(format!("{USER_HEADER} must be a numeric user id"))
      })
  }
}
