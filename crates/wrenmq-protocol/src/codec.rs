//! Codec trait and implementations for framing messages as datagram bytes.
//!
//! The base protocol's option/path byte packing is treated as a given
//! framing collaborator, so the codec is deliberately generic: anything
//! serde can serialize travels through it. [`JsonCodec`] is the default:
//! human-readable and trivially inspectable with tcpdump during
//! development. A compact binary codec can slot in later without touching
//! the broker or the client.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts messages to datagram payload bytes and back.
///
/// `Send + Sync + 'static` because the codec is shared by the server's
/// per-datagram tasks and the client's background loops.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] for malformed or truncated input.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that frames messages as JSON via `serde_json`.
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use wrenmq_protocol::{Codec, Command, JsonCodec, Message};
///
/// let codec = JsonCodec;
/// let message = Command::publish("temp", "21.5").encode(7);
///
/// let bytes = codec.encode(&message).unwrap();
/// let decoded: Message = codec.decode(&bytes).unwrap();
/// assert_eq!(message, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Command, Message};

    #[test]
    fn test_json_codec_round_trips_a_request() {
        let codec = JsonCodec;
        let message = Command::subscribe("garden/soil").encode(3);

        let bytes = codec.encode(&message).expect("encode");
        let decoded: Message = codec.decode(&bytes).expect("decode");

        assert_eq!(message, decoded);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let codec = JsonCodec;
        let result: Result<Message, _> = codec.decode(b"not a message");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_codec_rejects_wrong_shape() {
        let codec = JsonCodec;
        let result: Result<Message, _> = codec.decode(b"{\"topic\": \"x\"}");
        assert!(result.is_err());
    }
}
