//! Error types for the client session.

use wrenmq_protocol::{Code, ProtocolError};
use wrenmq_transport::TransportError;

/// Errors that can occur in client operations.
///
/// Every public session operation returns either a value or one of these;
/// a remote-reported failure never panics or aborts anything.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A socket-level failure (bind, send, receive, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The broker answered with a failure-family response code.
    #[error("broker rejected {context}: {code}")]
    Rejected {
        /// Which operation was rejected.
        context: &'static str,
        /// The failure response code, printed by its textual name.
        code: Code,
    },

    /// The operation is a protocol extension point with no implementation.
    #[error("{0} is not implemented")]
    Unsupported(&'static str),
}
