//! Caller identity middleware.
//!
//! [`IdentificatorLayer`] wraps an inner service so that every request
//! carries an [`Identifier`] derived from its transport peer address (the
//! host portion of [`PeerAddr`](crate::PeerAddr), port stripped). Requests
//! without a usable address are rejected with a bare `401 Unauthorized` and
//! never reach the inner service. No method or path filtering happens here;
//! that is the router's job.
//!
//! Downstream code reads the attribute back with [`identifier`], which
//! returns the distinct [`Error::NoIdentifier`] when nothing is attached.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Extensions, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use crate::error::Error;
use crate::peer::{self, PeerAddr};

/// Opaque string naming the caller's network origin.
///
/// Derived once per request by the identity middleware; read-only afterward.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Wrap an already-derived identifier, e.g. inside a custom
    /// [`IdentifierResolver`](crate::IdentifierResolver) that draws identity
    /// from a header or session instead of the transport address.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Look up the [`Identifier`] attached to a request context.
///
/// # Errors
///
/// Returns [`Error::NoIdentifier`] when the identity middleware has not run
/// (or rejected the request before attaching anything). Handlers should
/// branch on that sentinel explicitly; any other variant here is an
/// integration fault.
pub fn identifier(extensions: &Extensions) -> Result<&Identifier, Error> {
    extensions.get::<Identifier>().ok_or(Error::NoIdentifier)
}

/// Layer that applies the identity middleware to a service.
///
/// # Example
/// ```ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(IdentificatorLayer::new());
/// axum::serve(
///     listener,
///     app.into_make_service_with_connect_info::<PeerAddr>(),
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentificatorLayer;

impl IdentificatorLayer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for IdentificatorLayer {
    type Service = Identificator<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Identificator { inner }
    }
}

/// Service produced by [`IdentificatorLayer`].
#[derive(Debug, Clone)]
pub struct Identificator<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for Identificator<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let not_ready_inner = self.inner.clone();
        let mut ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);

        let derived = match request.extensions().get::<ConnectInfo<PeerAddr>>() {
            Some(ConnectInfo(addr)) => peer::host(addr.as_str()).map(Identifier::new),
            None => Err(Error::NoIdentifier),
        };

        match derived {
            Ok(id) => {
                request.extensions_mut().insert(id);
                Box::pin(async move { ready_inner.call(request).await })
            }
            Err(error) => {
                tracing::debug!(error = %error, "rejecting request without usable peer address");
                Box::pin(async move { Ok(StatusCode::UNAUTHORIZED.into_response()) })
            }
        }
    }
}
