//! Transport peer address carrier and host extraction.
//!
//! [`PeerAddr`] is the raw `host:port` string the identity middleware reads
//! from [`ConnectInfo`](axum::extract::ConnectInfo). Live servers populate it
//! with `Router::into_make_service_with_connect_info::<PeerAddr>()`; test
//! harnesses insert `ConnectInfo(PeerAddr::from(..))` into request
//! extensions directly.

use std::fmt;
use std::net::SocketAddr;

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

use crate::error::Error;

/// Raw transport peer address, conventionally `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddr(String);

impl PeerAddr {
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PeerAddr {
    fn from(addr: String) -> Self {
        Self(addr)
    }
}

impl From<&str> for PeerAddr {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

impl From<SocketAddr> for PeerAddr {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for PeerAddr {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        Self(stream.remote_addr().to_string())
    }
}

/// Extract the host portion of a `host:port` address.
///
/// Splits on the last colon and unbrackets IPv6 hosts, so
/// `"[::1]:8080"` yields `"::1"`. An address without a port, with an empty
/// host, or with a bare unbracketed IPv6 host is malformed.
pub(crate) fn host(addr: &str) -> Result<&str, Error> {
    let malformed = || Error::MalformedPeerAddr {
        addr: addr.to_string(),
    };

    let (raw, _port) = addr.rsplit_once(':').ok_or_else(malformed)?;
    if let Some(inner) = raw.strip_prefix('[') {
        return inner
            .strip_suffix(']')
            .filter(|h| !h.is_empty())
            .ok_or_else(malformed);
    }
    if raw.is_empty() || raw.contains(':') {
        return Err(malformed());
    }
    Ok(raw)
}
