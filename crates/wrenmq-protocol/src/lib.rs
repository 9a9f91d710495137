//! Wire protocol for wrenmq.
//!
//! This crate defines the "language" that clients and the broker speak:
//!
//! - **Messages** ([`Message`], [`Code`], [`MessageKind`]) — the
//!   request/response structures that travel inside datagrams, modeled on
//!   CoAP's confirmable/acknowledgement exchange.
//! - **Commands** ([`Command`], [`CommandKind`]) — the domain-level
//!   operations (create, publish, subscribe, …) and the pure translation
//!   between a command and its wire message.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages become
//!   bytes. The low-level CoAP option/path byte packing is out of scope;
//!   the codec is the given framing collaborator.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while translating.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw datagrams) and the
//! broker/client logic. It is entirely stateless apart from
//! [`MessageSequence`], the 16-bit message-ID counter both sides use to
//! correlate requests with acknowledgements.
//!
//! ```text
//! Transport (bytes) → Protocol (Message ⇄ Command) → Broker / Session
//! ```

mod codec;
mod command;
mod error;
mod message;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::{Command, CommandKind, OBSERVE_DEREGISTER, OBSERVE_REGISTER};
pub use error::ProtocolError;
pub use message::{Code, ContentFormat, Message, MessageKind, MessageSequence};
