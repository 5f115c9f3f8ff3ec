//! Authentication middleware with injected resolvers.
//!
//! [`AuthenticatorLayer`] is constructed with two collaborators supplied by
//! the application: an [`IdentifierResolver`] that produces the caller's
//! [`Identifier`] from the request context, and a [`ProfileResolver`] that
//! turns that identifier into an authentication profile (any type the
//! application chooses). The middleware orchestrates the two calls per
//! request, attaches the profile on success, and rejects with a bare
//! `401 Unauthorized` when the identifier is absent or either resolver
//! fails -- the wire response never distinguishes the two cases.
//!
//! Resolvers receive the request head ([`Parts`]) so they can draw identity
//! from the attached context, a header, or anything else; they may await
//! I/O. This middleware never parses addresses, headers, or credentials
//! itself.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{Extensions, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use crate::error::{BoxError, Error};
use crate::identificator::{identifier, Identifier};

/// Resolves the caller's [`Identifier`] from the request head.
///
/// `Ok(None)` means "no identity present" and is rejected without consulting
/// the profile resolver; `Err` means the resolution itself failed. Both
/// collapse to the same 401 on the wire.
#[async_trait]
pub trait IdentifierResolver: Send + Sync {
    async fn resolve(&self, parts: &Parts) -> Result<Option<Identifier>, BoxError>;
}

/// Resolves the authentication profile for an already-resolved identifier.
///
/// The profile type `P` is entirely application-defined; this crate never
/// inspects it.
#[async_trait]
pub trait ProfileResolver<P>: Send + Sync {
    async fn resolve(&self, parts: &Parts, id: &Identifier) -> Result<P, BoxError>;
}

/// Adapter wrapping a plain closure as an [`IdentifierResolver`].
pub struct IdentifierResolverFn<F>(F);

#[async_trait]
impl<F, Fut> IdentifierResolver for IdentifierResolverFn<F>
where
    F: Fn(&Parts) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Identifier>, BoxError>> + Send + 'static,
{
    async fn resolve(&self, parts: &Parts) -> Result<Option<Identifier>, BoxError> {
        (self.0)(parts).await
    }
}

/// Wrap a closure as an [`IdentifierResolver`].
///
/// The closure borrows the request head only while constructing its future,
/// so clone whatever the asynchronous part needs up front.
pub fn identifier_resolver_fn<F, Fut>(f: F) -> IdentifierResolverFn<F>
where
    F: Fn(&Parts) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Identifier>, BoxError>> + Send + 'static,
{
    IdentifierResolverFn(f)
}

/// Adapter wrapping a plain closure as a [`ProfileResolver`].
pub struct ProfileResolverFn<F>(F);

#[async_trait]
impl<F, Fut, P> ProfileResolver<P> for ProfileResolverFn<F>
where
    F: Fn(&Parts, &Identifier) -> Fut + Send + Sync,
    Fut: Future<Output = Result<P, BoxError>> + Send + 'static,
    P: 'static,
{
    async fn resolve(&self, parts: &Parts, id: &Identifier) -> Result<P, BoxError> {
        (self.0)(parts, id).await
    }
}

/// Wrap a closure as a [`ProfileResolver`].
pub fn profile_resolver_fn<F, Fut, P>(f: F) -> ProfileResolverFn<F>
where
    F: Fn(&Parts, &Identifier) -> Fut + Send + Sync,
    Fut: Future<Output = Result<P, BoxError>> + Send + 'static,
    P: 'static,
{
    ProfileResolverFn(f)
}

/// The canonical identifier resolver: delegates to the [`identifier`]
/// accessor, i.e. picks up whatever the identity middleware attached
/// upstream. Absence maps to `Ok(None)`, not an error.
#[must_use]
pub fn context_identifier_resolver() -> impl IdentifierResolver {
    identifier_resolver_fn(|parts: &Parts| {
        let resolved = identifier(&parts.extensions).ok().cloned();
        std::future::ready(Ok::<_, BoxError>(resolved))
    })
}

/// Crate-private extension entry holding the resolved profile, so
/// application code cannot forge an authenticated state by inserting a bare
/// `P` into extensions.
#[derive(Clone)]
pub(crate) struct Authenticated<P>(pub(crate) P);

/// Look up the authentication profile attached to a request context.
///
/// # Errors
///
/// Returns [`Error::NoAuthentication`] when the authentication middleware
/// has not run for this request (or rejected it). Handlers should branch on
/// that sentinel explicitly.
pub fn authentication<P>(extensions: &Extensions) -> Result<&P, Error>
where
    P: Clone + Send + Sync + 'static,
{
    extensions
        .get::<Authenticated<P>>()
        .map(|entry| &entry.0)
        .ok_or(Error::NoAuthentication)
}

/// Shared resolver pair injected at construction time.
struct Resolvers<P> {
    identifier: Arc<dyn IdentifierResolver>,
    profile: Arc<dyn ProfileResolver<P>>,
}

/// Layer that applies the authentication middleware to a service.
///
/// # Example
/// ```ignore
/// let layer = AuthenticatorLayer::new(
///     context_identifier_resolver(),
///     profile_resolver_fn(|_parts: &Parts, id| {
///         let id = id.clone();
///         async move { user_store.lookup(&id).await }
///     }),
/// );
/// let app = Router::new().route("/", get(handler)).layer(layer);
/// ```
pub struct AuthenticatorLayer<P> {
    resolvers: Arc<Resolvers<P>>,
}

impl<P> AuthenticatorLayer<P> {
    pub fn new<I, R>(identifier: I, profile: R) -> Self
    where
        I: IdentifierResolver + 'static,
        R: ProfileResolver<P> + 'static,
    {
        Self {
            resolvers: Arc::new(Resolvers {
                identifier: Arc::new(identifier),
                profile: Arc::new(profile),
            }),
        }
    }
}

// Manual impl: `P` itself need not be `Clone` to clone the `Arc`s.
impl<P> Clone for AuthenticatorLayer<P> {
    fn clone(&self) -> Self {
        Self {
            resolvers: Arc::clone(&self.resolvers),
        }
    }
}

impl<S, P> Layer<S> for AuthenticatorLayer<P> {
    type Service = Authenticator<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        Authenticator {
            inner,
            resolvers: Arc::clone(&self.resolvers),
        }
    }
}

/// Service produced by [`AuthenticatorLayer`].
pub struct Authenticator<S, P> {
    inner: S,
    resolvers: Arc<Resolvers<P>>,
}

impl<S: Clone, P> Clone for Authenticator<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            resolvers: Arc::clone(&self.resolvers),
        }
    }
}

impl<S, P> Service<Request<Body>> for Authenticator<S, P>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    P: Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let resolvers = Arc::clone(&self.resolvers);
        let not_ready_inner = self.inner.clone();
        let mut ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();

            let id = match resolvers.identifier.resolve(&parts).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    tracing::debug!(error = %Error::NoIdentifier, "rejecting unidentified request");
                    return Ok(StatusCode::UNAUTHORIZED.into_response());
                }
                Err(source) => {
                    let error = Error::resolver(source);
                    tracing::debug!(error = %error, "identifier resolution failed");
                    return Ok(StatusCode::UNAUTHORIZED.into_response());
                }
            };

            let profile = match resolvers.profile.resolve(&parts, &id).await {
                Ok(profile) => profile,
                Err(source) => {
                    let error = Error::resolver(source);
                    tracing::debug!(identifier = %id, error = %error, "profile resolution failed");
                    return Ok(StatusCode::UNAUTHORIZED.into_response());
                }
            };

            parts.extensions.insert(Authenticated(profile));
            ready_inner.call(Request::from_parts(parts, body)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_parts() -> Parts {
        let (parts, ()) = Request::builder().body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn context_resolver_reads_attached_identifier() {
        let mut parts = empty_parts();
        parts.extensions.insert(Identifier::new("192.0.2.1"));

        let resolver = context_identifier_resolver();
        let resolved = resolver.resolve(&parts).await.unwrap();
        assert_eq!(resolved.unwrap().as_str(), "192.0.2.1");
    }

    #[tokio::test]
    async fn context_resolver_maps_absence_to_none() {
        let parts = empty_parts();

        let resolver = context_identifier_resolver();
        assert!(resolver.resolve(&parts).await.unwrap().is_none());
    }

    #[test]
    fn accessor_signals_absence_with_sentinel() {
        let extensions = Extensions::new();
        assert!(matches!(
            authentication::<String>(&extensions),
            Err(Error::NoAuthentication)
        ));
    }

    #[test]
    fn accessor_returns_attached_profile() {
        let mut extensions = Extensions::new();
        extensions.insert(Authenticated("USERAUTH".to_string()));

        assert_eq!(authentication::<String>(&extensions).unwrap(), "USERAUTH");
        // Idempotent: a second lookup sees the same value
        assert_eq!(authentication::<String>(&extensions).unwrap(), "USERAUTH");
    }

    #[test]
    fn bare_profile_in_extensions_is_not_authentication() {
        let mut extensions = Extensions::new();
        extensions.insert("forged".to_string());

        assert!(matches!(
            authentication::<String>(&extensions),
            Err(Error::NoAuthentication)
        ));
    }
}
