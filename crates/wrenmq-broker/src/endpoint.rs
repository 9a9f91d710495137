//! Endpoint identity.

use std::fmt;
use std::net::SocketAddr;

/// An opaque, comparable identifier for a remote datagram peer.
///
/// Newtype over the peer's socket address. The registry only ever compares
/// endpoints and uses them as map keys; it never assumes the peer is
/// reachable or alive. Reachability is a separate concern handled by
/// [`ClientLiveness`](crate::ClientLiveness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(SocketAddr);

impl Endpoint {
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// The underlying address, needed only at the socket boundary when a
    /// fan-out message is actually sent.
    pub fn addr(self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
