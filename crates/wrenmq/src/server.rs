//! `BrokerServer` builder and datagram dispatch loop.
//!
//! This is the entry point for running a wrenmq broker. It ties the layers
//! together: transport (UDP socket) → protocol (wire decode) → broker
//! (registry dispatch) → transport again (acknowledgement + fan-out).

use std::sync::Arc;

use tokio::sync::Mutex;

use wrenmq_broker::{
    BrokerConfig, ClientLiveness, Endpoint, RequestHandler,
};
use wrenmq_protocol::{Codec, JsonCodec, Message};
use wrenmq_transport::UdpServerSocket;

use crate::WrenmqError;

/// Shared server state, cloned into each per-datagram task.
struct ServerState {
    handler: RequestHandler,
    liveness: Mutex<ClientLiveness>,
    codec: JsonCodec,
}

/// Builder for configuring and starting a broker.
///
/// # Example
///
/// ```rust,no_run
/// use wrenmq::prelude::*;
///
/// # async fn run() -> Result<(), WrenmqError> {
/// let server = BrokerServer::builder()
///     .bind("0.0.0.0:5683")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BrokerServerBuilder {
    config: BrokerConfig,
}

impl BrokerServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: BrokerConfig::default(),
        }
    }

    /// Sets the address to bind the broker's socket to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: BrokerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the socket and builds the server.
    pub async fn build(self) -> Result<BrokerServer, WrenmqError> {
        let socket = UdpServerSocket::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            handler: RequestHandler::new(),
            liveness: Mutex::new(ClientLiveness::new(
                self.config.liveness_grace,
            )),
            codec: JsonCodec,
        });

        Ok(BrokerServer {
            socket,
            state,
            config: self.config,
        })
    }
}

impl Default for BrokerServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running wrenmq broker.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct BrokerServer {
    socket: UdpServerSocket,
    state: Arc<ServerState>,
    config: BrokerConfig,
}

impl BrokerServer {
    /// Creates a new builder.
    pub fn builder() -> BrokerServerBuilder {
        BrokerServerBuilder::new()
    }

    /// Returns the local address the broker's socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs the broker's dispatch loop.
    ///
    /// Every inbound datagram gets its own task; there is no
    /// serialization across concurrent requests beyond the registry's
    /// single lock inside the handler. Runs until the process terminates
    /// or the socket fails unrecoverably.
    pub async fn run(self) -> Result<(), WrenmqError> {
        tracing::info!("wrenmq broker running");

        tokio::spawn(sweep_loop(
            Arc::clone(&self.state),
            self.config.sweep_interval,
        ));

        loop {
            match self.socket.recv_from().await {
                Ok((data, peer)) => {
                    let state = Arc::clone(&self.state);
                    let socket = self.socket.clone();
                    tokio::spawn(async move {
                        handle_datagram(socket, state, data, peer).await;
                    });
                }
                Err(e) => {
                    // Transient receive errors (e.g. ICMP-induced) must
                    // not take the broker down.
                    tracing::error!(error = %e, "receive failed");
                }
            }
        }
    }
}

/// Handles one inbound datagram end to end.
async fn handle_datagram(
    socket: UdpServerSocket,
    state: Arc<ServerState>,
    data: Vec<u8>,
    peer: std::net::SocketAddr,
) {
    // Undecodable bytes carry no message ID to answer to; drop them.
    let message: Message = match state.codec.decode(&data) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(%peer, error = %e, "dropping undecodable datagram");
            return;
        }
    };

    let endpoint = Endpoint::new(peer);

    // Any request proves the sender is alive.
    state.liveness.lock().await.touch(endpoint);

    let dispatch = state.handler.handle(endpoint, &message).await;

    match state.codec.encode(&dispatch.response) {
        Ok(bytes) => {
            if let Err(e) = socket.send_to(&bytes, peer).await {
                tracing::debug!(%endpoint, error = %e, "ack send failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "response encode failed"),
    }

    // Each fan-out delivery runs on its own task: one unreachable or slow
    // subscriber must not hold up the others. Fire-and-forget.
    for (subscriber, push) in dispatch.fanout {
        let bytes = match state.codec.encode(&push) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "publish encode failed");
                continue;
            }
        };
        let socket = socket.clone();
        tokio::spawn(async move {
            if let Err(e) = socket.send_to(&bytes, subscriber.addr()).await {
                tracing::debug!(
                    %subscriber,
                    error = %e,
                    "publish delivery failed"
                );
            }
        });
    }
}

/// Periodically expires silent endpoints and drops their subscriptions.
async fn sweep_loop(state: Arc<ServerState>, interval: std::time::Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let stale = state.liveness.lock().await.expire_stale();
        for endpoint in stale {
            tracing::info!(%endpoint, "dropping subscriptions of lost client");
            state.handler.remove_endpoint(&endpoint).await;
        }
    }
}
