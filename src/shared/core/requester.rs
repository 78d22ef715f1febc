// Identity of the caller, as established by the authentication layer in front of this service.
//
// The gateway authenticates the request and forwards the username in a trusted header.
// Requests without it never reach a handler.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
};

pub const AUTHENTICATED_USER_HEADER: &str = "x-authenticated-user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(AUTHENTICATED_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
    }

    pub fn username(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)
    }
}
