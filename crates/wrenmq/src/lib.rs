//! # wrenmq
//!
//! A lightweight publish/subscribe broker over UDP, speaking a CoAP-style
//! confirmable request/acknowledgement protocol. Clients create topics,
//! publish values, and subscribe to receive future values; heartbeats keep
//! the connectionless path alive in both directions.
//!
//! ```text
//! publisher ──PUT ps/temp──▶ BrokerServer ──▶ TopicRegistry
//!                                │                 │ fan-out
//!                                ▼                 ▼
//!                        acknowledgement   PUT ps/temp ──▶ each subscriber's
//!                                                          listen loop
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use wrenmq::prelude::*;
//!
//! # async fn run() -> Result<(), WrenmqError> {
//! // Broker:
//! let server = BrokerServer::builder().bind("0.0.0.0:5683").build().await?;
//! tokio::spawn(server.run());
//!
//! // Client:
//! let (session, _monitor) =
//!     Session::connect("127.0.0.1:5683", SessionConfig::default()).await?;
//! let subscription = session.subscribe("kitchen/temp").await?;
//! session.publish("kitchen/temp", "21.5").await?;
//! let value = subscription.recv().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod server;

pub use error::WrenmqError;
pub use server::{BrokerServer, BrokerServerBuilder};

/// One-stop imports for broker and client programs.
pub mod prelude {
    pub use crate::{BrokerServer, BrokerServerBuilder, WrenmqError};
    pub use wrenmq_broker::{
        BrokerConfig, BrokerError, Endpoint, Subscribed, TopicRegistry,
    };
    pub use wrenmq_client::{
        ClientError, Session, SessionConfig, SessionEvent, SessionMonitor,
        Subscription,
    };
    pub use wrenmq_protocol::{
        Code, Command, CommandKind, Message, MessageKind,
    };
}
