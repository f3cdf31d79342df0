//! Bearer token validation
//!
//! Decodes HS256 tokens issued by the login endpoint into an [`Identity`].
//! The same validator backs the WebSocket handshake and the HTTP bearer
//! extractor, so both surfaces reject credentials for identical reasons.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pos_core::{Identity, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Reason a credential was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication token required")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Authentication token expired")]
    TokenExpired,

    #[error("Token is missing required claim: {0}")]
    MissingClaims(&'static str),

    #[error("Token carries unknown role: {0}")]
    InvalidRole(String),

    #[error("JWT secret is not configured")]
    Configuration,

    #[error("Failed to sign token")]
    TokenCreation,
}

impl AuthError {
    /// Short reason safe to hand to the connecting client
    ///
    /// Claim and role problems collapse into the generic invalid-token
    /// category; server faults never describe themselves.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "Authentication token required",
            Self::InvalidToken | Self::MissingClaims(_) | Self::InvalidRole(_) => {
                "Invalid authentication token"
            }
            Self::TokenExpired => "Authentication token expired",
            Self::Configuration | Self::TokenCreation => "Server configuration error",
        }
    }

    /// Whether the failure is the server's fault rather than the caller's
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(self, Self::Configuration | Self::TokenCreation)
    }

    /// Get error code for API responses
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_AUTH",
            Self::InvalidToken | Self::MissingClaims(_) | Self::InvalidRole(_) => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Configuration | Self::TokenCreation => "CONFIG_ERROR",
        }
    }
}

/// Claims written by the token issuer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims as they arrive, before any required-field checks
///
/// Ids are accepted as either JSON strings or numbers since database
/// primary keys are usually integers.
#[derive(Debug, Deserialize)]
struct RawClaims {
    id: Option<Value>,
    email: Option<String>,
    role: Option<String>,
}

impl RawClaims {
    fn into_identity(self) -> Result<Identity, AuthError> {
        let id = match self.id {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(AuthError::MissingClaims("id")),
        };
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or(AuthError::MissingClaims("email"))?;
        let role = self.role.ok_or(AuthError::MissingClaims("role"))?;
        let role = Role::parse(&role).map_err(|_| AuthError::InvalidRole(role))?;

        Ok(Identity::new(id, email, role))
    }
}

/// Signs and verifies bearer tokens
///
/// Constructed without a secret the service still exists, but every
/// validation fails with [`AuthError::Configuration`] so the gateway can
/// report a server fault instead of refusing to start.
#[derive(Clone)]
pub struct JwtService {
    keys: Option<(EncodingKey, DecodingKey)>,
    token_expiry: i64,
}

impl JwtService {
    /// Create a JWT service with the given secret and default token lifetime
    #[must_use]
    pub fn new(secret: &str, token_expiry: i64) -> Self {
        Self::from_optional_secret(Some(secret), token_expiry)
    }

    /// Create a JWT service from a possibly-missing secret
    #[must_use]
    pub fn from_optional_secret(secret: Option<&str>, token_expiry: i64) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|s| {
            (
                EncodingKey::from_secret(s.as_bytes()),
                DecodingKey::from_secret(s.as_bytes()),
            )
        });

        Self { keys, token_expiry }
    }

    /// Whether a signing secret is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Default lifetime of issued tokens, in seconds
    #[must_use]
    pub fn token_expiry(&self) -> i64 {
        self.token_expiry
    }

    /// Validate a credential and return the identity it names
    ///
    /// A leading `Bearer` scheme (any case) is tolerated; a scheme with
    /// nothing after it counts as no credential at all.
    ///
    /// # Errors
    /// Returns an [`AuthError`] describing why the credential was refused
    pub fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let token = strip_bearer(token);
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let Some((_, decoding_key)) = &self.keys else {
            tracing::error!("JWT secret not configured; rejecting credential");
            return Err(AuthError::Configuration);
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<RawClaims>(token, decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::MissingRequiredClaim(_) => AuthError::MissingClaims("exp"),
                _ => AuthError::InvalidToken,
            }
        })?;

        data.claims.into_identity()
    }

    /// Issue a token for `identity` with the default lifetime
    ///
    /// # Errors
    /// Returns an error if no secret is configured or signing fails
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_with_ttl(identity, self.token_expiry)
    }

    /// Issue a token with an explicit lifetime in seconds (may be negative)
    ///
    /// # Errors
    /// Returns an error if no secret is configured or signing fails
    pub fn issue_with_ttl(&self, identity: &Identity, ttl_secs: i64) -> Result<String, AuthError> {
        let Some((encoding_key, _)) = &self.keys else {
            return Err(AuthError::Configuration);
        };

        let now = Utc::now();
        let expires_at = Duration::try_seconds(ttl_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                tracing::error!(ttl_secs, "Token lifetime out of range");
                AuthError::TokenCreation
            })?;

        let claims = Claims {
            id: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, encoding_key)
            .map_err(|_| AuthError::TokenCreation)
    }
}

/// Drop surrounding whitespace and an optional `Bearer` scheme
fn strip_bearer(token: &str) -> &str {
    let token = token.trim();
    match token.get(..6) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => token[6..].trim(),
        _ => token,
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("configured", &self.keys.is_some())
            .field("token_expiry", &self.token_expiry)
            .finish_non_exhaustive()
    }
}
