//! Unified error types for Doorman.
//!
//! Defines [`Error`], the closed error enum shared by both middlewares and
//! their context accessors, using `thiserror` for `Display` and `Error`
//! derives. The absent-sentinel variants ([`Error::NoIdentifier`],
//! [`Error::NoAuthentication`]) are distinct and matchable so handlers can
//! branch on "unauthenticated" explicitly instead of receiving a missing
//! value; any other variant reaching application code is an integration
//! fault and should fail loudly.

/// Boxed error type accepted from injected resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No [`Identifier`](crate::Identifier) is attached to the request
    /// context. Returned by the [`identifier`](crate::identifier) accessor;
    /// also the internal classification for a request that never carried a
    /// peer address.
    #[error("no identifier attached to the request context")]
    NoIdentifier,

    /// No authentication profile is attached to the request context.
    /// Returned by the [`authentication`](crate::authentication) accessor.
    #[error("no authentication profile attached to the request context")]
    NoAuthentication,

    /// The transport peer address could not be split into host and port.
    /// Collapses to the same bare 401 as [`Error::NoIdentifier`] at the HTTP
    /// layer; kept distinct internally.
    #[error("malformed peer address '{addr}': expected host:port")]
    MalformedPeerAddr { addr: String },

    /// An injected identifier or profile resolver failed. All resolver
    /// failures collapse to this one kind; the cause is preserved as the
    /// source for diagnostics only and never reaches the client.
    #[error("resolver failed: {source}")]
    Resolver {
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub(crate) fn resolver(source: BoxError) -> Self {
        Self::Resolver { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_sentinels_are_matchable() {
        assert!(matches!(Error::NoIdentifier, Error::NoIdentifier));
        assert!(matches!(Error::NoAuthentication, Error::NoAuthentication));
        // The two sentinels are distinct kinds
        assert!(!matches!(Error::NoIdentifier, Error::NoAuthentication));
    }

    #[test]
    fn resolver_failure_preserves_source() {
        let err = Error::resolver("user store unreachable".into());
        assert_eq!(err.to_string(), "resolver failed: user store unreachable");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn malformed_addr_names_the_input() {
        let err = Error::MalformedPeerAddr {
            addr: "127.0.0.1".into(),
        };
        assert!(err.to_string().contains("127.0.0.1"));
    }
}
