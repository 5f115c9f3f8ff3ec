//! Doorman is a pair of composable identity and authentication middlewares
//! for Tower-compatible HTTP stacks.
//!
//! [`IdentificatorLayer`] derives a caller [`Identifier`] from the transport
//! peer address and attaches it to the request. [`AuthenticatorLayer`] takes
//! two injected resolvers -- one producing an identifier, one producing an
//! application-defined authentication profile -- and attaches the resolved
//! profile. Either middleware rejects with a bare `401 Unauthorized` (empty
//! body, no diagnostics) when its attribute cannot be derived; downstream
//! handlers read the attributes through [`identifier`] / [`authentication`]
//! or the extractors in [`extract`].
//!
//! The two layers compose through ordinary Tower wrapping, so they can be
//! chained in any order the surrounding router supports:
//!
//! ```
//! use axum::{routing::get, Router};
//! use doorman::{AuthenticatorLayer, BoxError, Identifier, IdentificatorLayer};
//! use doorman::authenticator::{context_identifier_resolver, profile_resolver_fn};
//! use doorman::extract::Authentication;
//! use http::request::Parts;
//!
//! async fn whoami(Authentication(user): Authentication<String>) -> String {
//!     user
//! }
//!
//! let app: Router = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(AuthenticatorLayer::new(
//!         context_identifier_resolver(),
//!         profile_resolver_fn(|_parts: &Parts, id: &Identifier| {
//!             let name = format!("user-at-{id}");
//!             async move { Ok::<_, BoxError>(name) }
//!         }),
//!     ))
//!     .layer(IdentificatorLayer::new());
//! ```
//!
//! # Architecture
//!
//! - [`authenticator`] -- Resolver traits, [`AuthenticatorLayer`], and the
//!   [`authentication`] accessor.
//! - [`error`] -- The closed [`Error`] enum with distinct absent-sentinel
//!   variants, using `thiserror`.
//! - [`extract`] -- Axum extractors over the attached attributes.
//! - [`identificator`] -- [`Identifier`], [`IdentificatorLayer`], and the
//!   [`identifier`] accessor.
//! - [`peer`] -- [`PeerAddr`] and its connect-info wiring for live servers.

pub mod authenticator;
pub mod error;
pub mod extract;
pub mod identificator;
pub mod peer;

pub use authenticator::{authentication, AuthenticatorLayer, IdentifierResolver, ProfileResolver};
pub use error::{BoxError, Error};
pub use identificator::{identifier, Identificator, Identifier, IdentificatorLayer};
pub use peer::PeerAddr;
