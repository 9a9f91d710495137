//! Broker core for wrenmq.
//!
//! This crate holds everything the broker does between receiving a decoded
//! datagram and handing bytes back to the socket:
//!
//! 1. **Registry** ([`TopicRegistry`]) — topic values plus the two
//!    subscription indices, behind one mutual-exclusion domain.
//! 2. **Request handling** ([`RequestHandler`]) — dispatching a command to
//!    the registry and producing the acknowledgement and fan-out sends.
//! 3. **Liveness** ([`ClientLiveness`]) — missed-heartbeat expiry so a
//!    vanished client's subscriptions don't linger forever.
//!
//! No I/O happens here; the server crate owns the socket and performs the
//! sends this crate asks for. That keeps the registry lock away from the
//! network and makes every operation unit-testable.

mod config;
mod endpoint;
mod error;
mod handler;
mod liveness;
mod registry;

pub use config::BrokerConfig;
pub use endpoint::Endpoint;
pub use error::BrokerError;
pub use handler::{Dispatch, RequestHandler};
pub use liveness::ClientLiveness;
pub use registry::{Subscribed, TopicRegistry};
