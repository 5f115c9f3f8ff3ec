//! Axum extractors over the attached request attributes.
//!
//! Convenience wrappers for handlers that would otherwise call the
//! [`identifier`]/[`authentication`] accessors and map absence to 401
//! themselves. Rejections are bare `401 Unauthorized` responses, matching
//! the middlewares' own rejections; handlers that need to branch on absence
//! explicitly should keep using the accessors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::authenticator::authentication;
use crate::identificator::{identifier, Identifier};

/// Extracts the caller [`Identifier`]; rejects with 401 when the identity
/// middleware did not attach one.
#[derive(Debug, Clone)]
pub struct Identity(pub Identifier);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identifier(&parts.extensions)
            .cloned()
            .map(Identity)
            .map_err(|_| StatusCode::UNAUTHORIZED)
    }
}

/// Extracts the authentication profile; rejects with 401 when the
/// authentication middleware did not attach one.
#[derive(Debug, Clone)]
pub struct Authentication<P>(pub P);

impl<S, P> FromRequestParts<S> for Authentication<P>
where
    S: Send + Sync,
    P: Clone + Send + Sync + 'static,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authentication::<P>(&parts.extensions)
            .cloned()
            .map(Authentication)
            .map_err(|_| StatusCode::UNAUTHORIZED)
    }
}
