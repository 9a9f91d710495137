//! Datagram transport layer for wrenmq.
//!
//! Everything here deals in raw bytes and socket addresses; no knowledge
//! of the wire protocol. Two socket flavors cover the whole system:
//!
//! - [`UdpServerSocket`] — the broker's single listening socket. Receives
//!   from unboundedly many peers and can send to any of them.
//! - [`UdpClientSocket`] — a connected socket with an OS-assigned local
//!   port. Each client exchange (and each subscription) gets its own, which
//!   is how the broker tells endpoints apart on a connectionless transport.
//!
//! Retransmission and deduplication of confirmable messages belong to a
//! richer CoAP stack and are deliberately not implemented here; callers get
//! a timeout instead.

mod error;
mod udp;

pub use error::TransportError;
pub use udp::{MAX_DATAGRAM_SIZE, UdpClientSocket, UdpServerSocket};
