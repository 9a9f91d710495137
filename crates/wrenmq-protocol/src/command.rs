//! Domain commands and their translation to and from wire messages.
//!
//! This is the pub/sub "function set": every operation a client can ask of
//! the broker, expressed independently of the wire encoding, plus the two
//! pure functions that map a command onto a [`Message`] and back.
//!
//! URI template: `ps/{topic}` for ordinary commands, `hb` for the
//! keep-alive extension. A topic beginning with `?` marks a discover
//! request with a query filter.

use serde::{Deserialize, Serialize};

use crate::message::{Code, ContentFormat, Message, MessageKind};
use crate::ProtocolError;

/// Observe option value registering interest in a topic.
pub const OBSERVE_REGISTER: u32 = 0;
/// Observe option value withdrawing interest from a topic.
pub const OBSERVE_DEREGISTER: u32 = 1;

/// Namespace token for pub/sub command paths.
const NAMESPACE_PUBSUB: &str = "ps";
/// Namespace token for the heartbeat extension.
const NAMESPACE_HEARTBEAT: &str = "hb";

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// The kind of a domain command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// A message that decoded to no recognizable command.
    Invalid,
    /// Query the broker for topics matching a filter (extension point,
    /// filter grammar unimplemented).
    Discover,
    /// Create a topic with an empty value.
    Create,
    /// Store a value and fan it out to the topic's subscribers.
    Publish,
    /// Register interest in a topic.
    Subscribe,
    /// Withdraw interest from a topic.
    Unsubscribe,
    /// Read a topic's latest value.
    Read,
    /// Delete a topic and all its subscriptions.
    Remove,
    /// Proprietary keep-alive probe; keeps NAT mappings open and lets both
    /// sides detect peer loss.
    Heartbeat,
}

impl CommandKind {
    /// The wire code this command is requested with.
    fn code(self) -> Code {
        match self {
            Self::Discover | Self::Subscribe | Self::Unsubscribe | Self::Read => {
                Code::Get
            }
            Self::Create => Code::Post,
            Self::Publish => Code::Put,
            Self::Remove => Code::Delete,
            // The heartbeat is not part of the base protocol; it borrows
            // the Content success code as its marker.
            Self::Heartbeat => Code::Content,
            Self::Invalid => Code::BadRequest,
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A decoded domain command: what to do, to which topic, with what data.
///
/// `topic` is empty for heartbeats; `payload` is only meaningful for
/// publishes (it carries the value) but round-trips for every valid kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub topic: String,
    pub payload: String,
}

impl Command {
    pub fn new(
        kind: CommandKind,
        topic: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn create(topic: impl Into<String>) -> Self {
        Self::new(CommandKind::Create, topic, "")
    }

    pub fn publish(
        topic: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self::new(CommandKind::Publish, topic, payload)
    }

    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self::new(CommandKind::Subscribe, topic, "")
    }

    pub fn unsubscribe(topic: impl Into<String>) -> Self {
        Self::new(CommandKind::Unsubscribe, topic, "")
    }

    pub fn read(topic: impl Into<String>) -> Self {
        Self::new(CommandKind::Read, topic, "")
    }

    pub fn remove(topic: impl Into<String>) -> Self {
        Self::new(CommandKind::Remove, topic, "")
    }

    /// A discover request; the filter rides in the topic slot behind `?`.
    pub fn discover(filter: &str) -> Self {
        Self::new(CommandKind::Discover, format!("?{filter}"), "")
    }

    pub fn heartbeat() -> Self {
        Self::new(CommandKind::Heartbeat, "", "")
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    /// Encodes this command as a request message.
    ///
    /// Every command is a confirmable request except the heartbeat, which
    /// is non-confirmable (losing one is harmless; the next fires soon).
    /// Subscribe and unsubscribe share the read method and are told apart
    /// solely by the observe option value.
    pub fn encode(&self, message_id: u16) -> Message {
        let kind = if self.kind == CommandKind::Heartbeat {
            MessageKind::NonConfirmable
        } else {
            MessageKind::Confirmable
        };

        let path = if self.kind == CommandKind::Heartbeat {
            vec![NAMESPACE_HEARTBEAT.to_string()]
        } else {
            // TODO(discover): append query-filter options once the filter
            // grammar is settled; today the raw `?filter` topic is all
            // that goes out.
            vec![NAMESPACE_PUBSUB.to_string(), self.topic.clone()]
        };

        let observe = match self.kind {
            CommandKind::Subscribe => Some(OBSERVE_REGISTER),
            CommandKind::Unsubscribe => Some(OBSERVE_DEREGISTER),
            _ => None,
        };

        Message {
            kind,
            code: self.kind.code(),
            message_id,
            path,
            content_format: ContentFormat::LinkFormat,
            observe,
            payload: self.payload.clone().into_bytes(),
        }
    }

    // -----------------------------------------------------------------------
    // Decoding
    // -----------------------------------------------------------------------

    /// Decodes a received message into a command.
    ///
    /// A message with no path at all is malformed and rejected. Anything
    /// else decodes, possibly to [`CommandKind::Invalid`], which the
    /// broker answers with Bad Request rather than dropping silently.
    /// The payload is attached only when the command resolved to a real
    /// kind.
    pub fn decode(message: &Message) -> Result<Command, ProtocolError> {
        if message.path.is_empty() {
            return Err(ProtocolError::EmptyPath);
        }

        let topic = message.path.get(1).cloned().unwrap_or_default();

        let kind = match message.code {
            Code::Get => match message.observe {
                Some(OBSERVE_REGISTER) => CommandKind::Subscribe,
                Some(OBSERVE_DEREGISTER) => CommandKind::Unsubscribe,
                Some(_) => CommandKind::Invalid,
                None if topic.starts_with('?') => CommandKind::Discover,
                None if !topic.is_empty() => CommandKind::Read,
                None => CommandKind::Invalid,
            },
            Code::Post => CommandKind::Create,
            Code::Put => CommandKind::Publish,
            Code::Delete => CommandKind::Remove,
            Code::Content => CommandKind::Heartbeat,
            _ => CommandKind::Invalid,
        };

        let payload = if kind == CommandKind::Invalid {
            String::new()
        } else {
            String::from_utf8_lossy(&message.payload).into_owned()
        };

        Ok(Command {
            kind,
            topic,
            payload,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The command↔message mapping is the contract both sides depend on,
    //! so every kind gets an explicit round-trip, and the observe-only
    //! disambiguation of subscribe vs unsubscribe is pinned down in both
    //! directions.

    use super::*;

    fn round_trip(command: &Command) -> Command {
        let message = command.encode(42);
        Command::decode(&message).expect("decode should succeed")
    }

    // =====================================================================
    // Encoding shapes
    // =====================================================================

    #[test]
    fn test_encode_uses_ps_namespace_for_pubsub_commands() {
        let message = Command::read("temp").encode(1);
        assert_eq!(message.path, vec!["ps".to_string(), "temp".to_string()]);
    }

    #[test]
    fn test_encode_uses_hb_namespace_for_heartbeat() {
        let message = Command::heartbeat().encode(1);
        assert_eq!(message.path, vec!["hb".to_string()]);
        assert_eq!(message.code, Code::Content);
        assert_eq!(message.kind, MessageKind::NonConfirmable);
    }

    #[test]
    fn test_encode_all_commands_except_heartbeat_are_confirmable() {
        let commands = [
            Command::discover("sensors"),
            Command::create("t"),
            Command::publish("t", "v"),
            Command::subscribe("t"),
            Command::unsubscribe("t"),
            Command::read("t"),
            Command::remove("t"),
        ];
        for command in &commands {
            assert_eq!(
                command.encode(1).kind,
                MessageKind::Confirmable,
                "{:?} should be confirmable",
                command.kind
            );
        }
    }

    #[test]
    fn test_encode_method_mapping() {
        assert_eq!(Command::discover("x").encode(1).code, Code::Get);
        assert_eq!(Command::subscribe("x").encode(1).code, Code::Get);
        assert_eq!(Command::unsubscribe("x").encode(1).code, Code::Get);
        assert_eq!(Command::read("x").encode(1).code, Code::Get);
        assert_eq!(Command::create("x").encode(1).code, Code::Post);
        assert_eq!(Command::publish("x", "v").encode(1).code, Code::Put);
        assert_eq!(Command::remove("x").encode(1).code, Code::Delete);
    }

    #[test]
    fn test_encode_sets_observe_only_for_subscribe_and_unsubscribe() {
        assert_eq!(
            Command::subscribe("t").encode(1).observe,
            Some(OBSERVE_REGISTER)
        );
        assert_eq!(
            Command::unsubscribe("t").encode(1).observe,
            Some(OBSERVE_DEREGISTER)
        );
        assert_eq!(Command::read("t").encode(1).observe, None);
        assert_eq!(Command::publish("t", "v").encode(1).observe, None);
    }

    #[test]
    fn test_encode_always_sets_link_format() {
        for command in [Command::read("t"), Command::heartbeat()] {
            assert_eq!(
                command.encode(1).content_format,
                ContentFormat::LinkFormat
            );
        }
    }

    #[test]
    fn test_encode_carries_message_id() {
        assert_eq!(Command::read("t").encode(40113).message_id, 40113);
    }

    // =====================================================================
    // Decoding
    // =====================================================================

    #[test]
    fn test_decode_empty_path_is_an_error() {
        let mut message = Command::read("t").encode(1);
        message.path.clear();
        assert!(matches!(
            Command::decode(&message),
            Err(ProtocolError::EmptyPath)
        ));
    }

    #[test]
    fn test_decode_get_without_observe_and_empty_topic_is_invalid() {
        let message = Message {
            kind: MessageKind::Confirmable,
            code: Code::Get,
            message_id: 1,
            path: vec!["ps".into()],
            content_format: ContentFormat::LinkFormat,
            observe: None,
            payload: b"ignored".to_vec(),
        };
        let command = Command::decode(&message).expect("should decode");
        assert_eq!(command.kind, CommandKind::Invalid);
        // Invalid commands never pick up the payload.
        assert_eq!(command.payload, "");
    }

    #[test]
    fn test_decode_unknown_observe_value_is_invalid() {
        let mut message = Command::subscribe("t").encode(1);
        message.observe = Some(7);
        let command = Command::decode(&message).expect("should decode");
        assert_eq!(command.kind, CommandKind::Invalid);
    }

    #[test]
    fn test_decode_question_mark_topic_is_discover() {
        let message = Command::read("?lights").encode(1);
        let command = Command::decode(&message).expect("should decode");
        assert_eq!(command.kind, CommandKind::Discover);
        assert_eq!(command.topic, "?lights");
    }

    #[test]
    fn test_decode_response_code_is_invalid_command() {
        // An acknowledgement code in request position decodes to Invalid
        // rather than erroring; the broker answers it with Bad Request.
        let message = Message {
            kind: MessageKind::Confirmable,
            code: Code::NotFound,
            message_id: 1,
            path: vec!["ps".into(), "t".into()],
            content_format: ContentFormat::LinkFormat,
            observe: None,
            payload: Vec::new(),
        };
        let command = Command::decode(&message).expect("should decode");
        assert_eq!(command.kind, CommandKind::Invalid);
    }

    // =====================================================================
    // Round trips
    // =====================================================================

    #[test]
    fn test_round_trip_preserves_kind_topic_payload() {
        let commands = [
            Command::create("kitchen/temp"),
            Command::publish("kitchen/temp", "21.5"),
            Command::read("kitchen/temp"),
            Command::remove("kitchen/temp"),
            Command::discover("kitchen"),
            Command::heartbeat(),
        ];
        for command in &commands {
            let decoded = round_trip(command);
            assert_eq!(&decoded, command, "round trip for {:?}", command.kind);
        }
    }

    #[test]
    fn test_round_trip_subscribe_distinguished_by_observe_zero() {
        // Subscribe and read share the GET method; only observe=0 makes
        // this a subscribe on the way back in.
        let message = Command::subscribe("temp").encode(9);
        assert_eq!(message.code, Code::Get);
        assert_eq!(message.observe, Some(0));

        let decoded = Command::decode(&message).expect("decode");
        assert_eq!(decoded.kind, CommandKind::Subscribe);
        assert_eq!(decoded.topic, "temp");
    }

    #[test]
    fn test_round_trip_unsubscribe_distinguished_by_observe_one() {
        let message = Command::unsubscribe("temp").encode(9);
        assert_eq!(message.code, Code::Get);
        assert_eq!(message.observe, Some(1));

        let decoded = Command::decode(&message).expect("decode");
        assert_eq!(decoded.kind, CommandKind::Unsubscribe);
        assert_eq!(decoded.topic, "temp");
    }

    #[test]
    fn test_round_trip_publish_carries_payload() {
        let decoded = round_trip(&Command::publish("t", "the value"));
        assert_eq!(decoded.kind, CommandKind::Publish);
        assert_eq!(decoded.payload, "the value");
    }
}
