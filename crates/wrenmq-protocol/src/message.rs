//! Wire message types.
//!
//! A [`Message`] is what actually travels inside a datagram: a CoAP-style
//! request or acknowledgement with a method/response code, a 16-bit message
//! ID, a hierarchical path, a small fixed option set, and an opaque payload.

use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The transmission semantics of a message.
///
/// `Confirmable` requests expect an [`Acknowledgement`](Self::Acknowledgement)
/// carrying the same message ID. `NonConfirmable` is used for the keep-alive
/// heartbeat, which tolerates loss by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Confirmable,
    NonConfirmable,
    Acknowledgement,
}

// ---------------------------------------------------------------------------
// Code
// ---------------------------------------------------------------------------

/// Method and response codes used on the wire.
///
/// One enum covers both directions: requests carry a method
/// (`Get`/`Post`/`Put`/`Delete`, plus `Content`, which doubles as the
/// proprietary heartbeat marker), acknowledgements carry a success or
/// failure response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Code {
    // -- Methods --
    Get,
    Post,
    Put,
    Delete,

    // -- Success responses --
    Created,
    Deleted,
    Changed,
    Content,

    // -- Failure responses --
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    NotAcceptable,
}

impl Code {
    /// Returns `true` for the request methods.
    pub fn is_method(self) -> bool {
        matches!(self, Self::Get | Self::Post | Self::Put | Self::Delete)
    }

    /// Returns `true` for the success-family response codes.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Created | Self::Deleted | Self::Changed | Self::Content
        )
    }

    /// The textual name used when surfacing a response code in an error.
    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Created => "Created",
            Self::Deleted => "Deleted",
            Self::Changed => "Changed",
            Self::Content => "Content",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::NotAcceptable => "Not Acceptable",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ContentFormat
// ---------------------------------------------------------------------------

/// The content-format option.
///
/// Requests always carry `LinkFormat`; `TextPlain` exists for completeness
/// but nothing in the system emits it today.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
pub enum ContentFormat {
    TextPlain,
    #[default]
    LinkFormat,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single wire message.
///
/// ```text
/// ┌──────────────────────────────────┐
/// │ kind: Confirmable                │  ← expects an acknowledgement
/// │ code: Put                        │  ← method or response code
/// │ message_id: 40113                │  ← request/response correlation
/// │ path: ["ps", "temp"]             │  ← namespace token + topic
/// │ content_format: LinkFormat       │
/// │ observe: None                    │  ← 0 = register, 1 = deregister
/// │ payload: b"21.5"                 │
/// └──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub code: Code,
    pub message_id: u16,

    /// Ordered path segments. Empty on acknowledgements.
    #[serde(default)]
    pub path: Vec<String>,

    /// Always set; defaults keep old peers decodable if the field is absent.
    #[serde(default)]
    pub content_format: ContentFormat,

    /// The observe option, present only on subscribe/unsubscribe requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observe: Option<u32>,

    #[serde(default)]
    pub payload: Vec<u8>,
}

impl Message {
    /// Builds the acknowledgement for this request.
    ///
    /// The response mirrors the request's message ID (the only
    /// correlation mechanism the transport offers) and carries a response
    /// code plus an optional payload (e.g. the stored value for a read).
    pub fn ack(&self, code: Code, payload: Vec<u8>) -> Message {
        Message {
            kind: MessageKind::Acknowledgement,
            code,
            message_id: self.message_id,
            path: Vec::new(),
            content_format: self.content_format,
            observe: None,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// MessageSequence
// ---------------------------------------------------------------------------

/// Monotonically increasing 16-bit message-ID source.
///
/// The wire protocol requires message IDs to be unlikely to collide across
/// process restarts, so the counter is seeded randomly rather than starting
/// at zero. Wrapping on overflow is fine: by the time the counter laps,
/// the old exchanges are long finished.
#[derive(Debug)]
pub struct MessageSequence {
    next: AtomicU16,
}

impl MessageSequence {
    /// Creates a sequence with a random starting point.
    pub fn new() -> Self {
        let mut rng = rand::rng();
        Self::seeded(rng.random())
    }

    /// Creates a sequence starting at `seed`. Useful in tests.
    pub fn seeded(seed: u16) -> Self {
        Self {
            next: AtomicU16::new(seed),
        }
    }

    /// Allocates the next message ID.
    pub fn next_id(&self) -> u16 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MessageSequence {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
