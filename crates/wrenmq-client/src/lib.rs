//! Client session for wrenmq.
//!
//! A [`Session`] is one logical publisher/subscriber identity bound to one
//! broker address. It covers three concerns that run in parallel:
//!
//! 1. **One-shot requests** — create/publish/read/remove, each a fresh
//!    request/acknowledgement exchange on its own socket.
//! 2. **Subscriptions** — per-topic background listen loops delivering
//!    server-pushed values over a bounded channel ([`Subscription`]).
//! 3. **Heartbeats** — a background loop that keeps the datagram path
//!    alive and reports broker loss through the [`SessionMonitor`]
//!    returned at construction, leaving the recovery policy to the owner.
//!
//! Background work has an explicit lifecycle: construction returns the
//! monitor, [`Session::unsubscribe`] deterministically stops one listen
//! loop, and [`Session::close`] stops everything.

mod config;
mod conn;
mod error;
mod session;
mod subscription;

pub use config::SessionConfig;
pub use error::ClientError;
pub use session::{Session, SessionEvent, SessionMonitor};
pub use subscription::Subscription;
