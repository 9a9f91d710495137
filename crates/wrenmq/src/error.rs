//! Unified error type for the wrenmq meta-crate.

use wrenmq_broker::BrokerError;
use wrenmq_client::ClientError;
use wrenmq_protocol::ProtocolError;
use wrenmq_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// Users of the `wrenmq` meta-crate deal with this single type; the
/// `#[from]` conversions let `?` lift layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WrenmqError {
    /// A socket-level error (bind, send, recv, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A wire-translation error (encode, decode, empty path).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry policy error (topic exists, topic not found).
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// A client session error (rejection, transport, unsupported op).
    #[error(transparent)]
    Client(#[from] ClientError),
}
