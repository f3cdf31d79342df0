//! Connection handshake
//!
//! Extracts the bearer credential from an upgrade request and validates it
//! before any socket exists. A rejected handshake never reaches the room
//! manager.

use axum::http::{header, HeaderMap};
use pos_common::{AuthError, JwtService};
use pos_core::Identity;
use serde::Deserialize;

use crate::connection::ConnectionState;

/// Query parameters accepted on the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    pub token: Option<String>,
}

/// Pre-admission state of one upgrade request
#[derive(Debug)]
pub struct Handshake {
    state: ConnectionState,
    token: Option<String>,
}

impl Handshake {
    /// Start a handshake; the `token` query parameter wins over the header
    #[must_use]
    pub fn new(query: HandshakeQuery, headers: &HeaderMap) -> Self {
        let token = query
            .token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| bearer_token(headers));

        Self {
            state: ConnectionState::Connecting,
            token,
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Validate the credential, ending in `Admitted` or `Rejected`
    ///
    /// # Errors
    /// Returns the reason the credential was refused
    pub fn authenticate(&mut self, jwt: &JwtService) -> Result<Identity, AuthError> {
        if self.state != ConnectionState::Connecting {
            return Err(AuthError::InvalidToken);
        }
        self.advance(ConnectionState::Authenticating);

        let result = match self.token.as_deref() {
            Some(token) => jwt.validate(token),
            None => Err(AuthError::MissingToken),
        };

        match &result {
            Ok(identity) => {
                self.advance(ConnectionState::Admitted);
                tracing::debug!(user_id = %identity.id, role = %identity.role, "Handshake accepted");
            }
            Err(e) => {
                self.advance(ConnectionState::Rejected);
                tracing::warn!(reason = %e.reason(), error = %e, "Handshake rejected");
            }
        }

        result
    }

    fn advance(&mut self, next: ConnectionState) {
        if let Err(e) = self.state.transition(next) {
            tracing::error!(error = %e, "Handshake state machine violated");
        }
    }
}

/// Token from an `Authorization: Bearer` header, if present
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pos_core::Role;

    const SECRET: &str = "handshake-test-secret";

    fn jwt() -> JwtService {
        JwtService::new(SECRET, 3600)
    }

    fn token(role: Role) -> String {
        jwt()
            .issue(&Identity::new("u1", "u1@example.com", role))
            .unwrap()
    }

    fn query(token: &str) -> HandshakeQuery {
        HandshakeQuery {
            token: Some(token.to_string()),
        }
    }

    #[test]
    fn test_query_token_admits() {
        let mut handshake = Handshake::new(query(&token(Role::Waiter)), &HeaderMap::new());
        assert_eq!(handshake.state(), ConnectionState::Connecting);

        let identity = handshake.authenticate(&jwt()).unwrap();
        assert_eq!(identity.role, Role::Waiter);
        assert_eq!(handshake.state(), ConnectionState::Admitted);
    }

    #[test]
    fn test_header_token_admits() {
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", token(Role::Kitchen));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());

        let mut handshake = Handshake::new(HandshakeQuery::default(), &headers);
        assert_eq!(handshake.authenticate(&jwt()).unwrap().role, Role::Kitchen);
    }

    #[test]
    fn test_query_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer garbage"));

        let mut handshake = Handshake::new(query(&token(Role::Owner)), &headers);
        assert_eq!(handshake.authenticate(&jwt()).unwrap().role, Role::Owner);
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut handshake = Handshake::new(HandshakeQuery::default(), &HeaderMap::new());
        assert_eq!(handshake.authenticate(&jwt()), Err(AuthError::MissingToken));
        assert_eq!(handshake.state(), ConnectionState::Rejected);
    }

    #[test]
    fn test_blank_bearer_query_token_is_missing() {
        let mut handshake = Handshake::new(query("Bearer "), &HeaderMap::new());
        let err = handshake.authenticate(&jwt()).unwrap_err();
        assert_eq!(err, AuthError::MissingToken);
        assert_eq!(err.reason(), "Authentication token required");
        assert_eq!(handshake.state(), ConnectionState::Rejected);
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = jwt()
            .issue_with_ttl(&Identity::new("u1", "a@b.c", Role::Waiter), -60)
            .unwrap();
        let mut handshake = Handshake::new(query(&expired), &HeaderMap::new());
        assert_eq!(handshake.authenticate(&jwt()), Err(AuthError::TokenExpired));
        assert_eq!(handshake.state(), ConnectionState::Rejected);
    }

    #[test]
    fn test_unconfigured_secret_is_configuration_error() {
        let unconfigured = JwtService::from_optional_secret(None, 3600);
        let mut handshake = Handshake::new(query(&token(Role::Waiter)), &HeaderMap::new());
        let err = handshake.authenticate(&unconfigured).unwrap_err();
        assert_eq!(err, AuthError::Configuration);
        assert!(err.is_server_fault());
    }

    #[test]
    fn test_authenticate_only_once() {
        let mut handshake = Handshake::new(query(&token(Role::Waiter)), &HeaderMap::new());
        handshake.authenticate(&jwt()).unwrap();
        assert!(handshake.authenticate(&jwt()).is_err());
        assert_eq!(handshake.state(), ConnectionState::Admitted);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
