//! Authentication extractors
//!
//! Validate the bearer token from the Authorization header with the same
//! validator the WebSocket handshake uses.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use pos_common::AuthError;
use pos_core::Identity;

use crate::response::ApiError;
use crate::server::GatewayState;

/// Identity of any authenticated caller
#[derive(Debug, Clone)]
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
    GatewayState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Auth(AuthError::MissingToken))?;

        let gateway = GatewayState::from_ref(state);

        let identity = gateway.jwt().validate(bearer.token()).map_err(|e| {
            tracing::warn!(error = %e, "Rejected bearer token");
            ApiError::Auth(e)
        })?;

        Ok(Self(identity))
    }
}

/// Identity of an owner or admin caller
#[derive(Debug, Clone)]
pub struct PrivilegedIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for PrivilegedIdentity
where
    S: Send + Sync,
    GatewayState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthIdentity(identity) = AuthIdentity::from_request_parts(parts, state).await?;

        if !identity.role.is_privileged() {
            tracing::warn!(
                user_id = %identity.id,
                role = %identity.role,
                "Privileged route refused"
            );
            return Err(ApiError::Forbidden);
        }

        Ok(Self(identity))
    }
}
