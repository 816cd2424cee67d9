//! Session context binding.
//!
//! The identity is resolved exactly once per connection handshake (or per
//! HTTP request) and carried by reference into every handler afterwards.
//! Nothing re-derives identity from ambient state, and an absent identity
//! means every privileged operation downstream denies on its own.

use axum::http::HeaderMap;

use kaiwa_core::{Error, Identity, Result, SessionResolver};

use crate::hub::ConnectionId;
use crate::state::AppState;

/// Resolved context for one live realtime connection.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub connection_id: ConnectionId,
    /// None for connections that presented no (or an invalid) token.
    pub identity: Option<Identity>,
}

impl SessionContext {
    /// The bound identity, or `Unauthenticated` — used at the top of every
    /// privileged event handler.
    pub fn require_identity(&self) -> Result<&Identity> {
        self.identity
            .as_ref()
            .ok_or_else(|| Error::Unauthenticated("no bound identity".to_string()))
    }
}

/// Extract the bearer token from an Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the request's bearer token to an identity, failing closed.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity> {
    let token =
        bearer_token(headers).ok_or_else(|| Error::Unauthenticated("missing bearer token".to_string()))?;
    state
        .sessions
        .resolve(token)
        .await?
        .ok_or_else(|| Error::Unauthenticated("unknown or expired session".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_require_identity_fails_closed() {
        let ctx = SessionContext {
            connection_id: crate::hub::ConnectionId::test_id(),
            identity: None,
        };
        assert!(matches!(
            ctx.require_identity(),
            Err(Error::Unauthenticated(_))
        ));
    }
}
