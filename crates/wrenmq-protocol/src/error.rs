//! Error types for the protocol layer.

/// Errors that can occur while translating messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization into datagram bytes failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization from datagram bytes failed.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A request arrived with no path segments at all, so there is no
    /// command to dispatch. Answered with Bad Request.
    #[error("message carries no path segments")]
    EmptyPath,
}
