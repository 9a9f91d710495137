//! UDP socket wrappers built on `tokio::net::UdpSocket`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::TransportError;

/// Upper bound for a single datagram's payload.
///
/// CoAP-style messages are small; this leaves generous headroom without
/// allocating wastefully large receive buffers.
pub const MAX_DATAGRAM_SIZE: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// UdpServerSocket
// ---------------------------------------------------------------------------

/// The broker's listening socket.
///
/// Cheap to clone: the underlying socket is shared behind an `Arc`, so
/// the receive loop and any number of spawned send tasks can use it
/// concurrently without coordination.
#[derive(Clone)]
pub struct UdpServerSocket {
    socket: Arc<UdpSocket>,
}

impl UdpServerSocket {
    /// Binds a new server socket to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "datagram socket listening");
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Returns the local address the socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Waits for the next inbound datagram and returns it with its sender.
    pub async fn recv_from(
        &self,
    ) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let (len, peer) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        buf.truncate(len);
        Ok((buf, peer))
    }

    /// Sends one datagram to the given peer.
    pub async fn send_to(
        &self,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<(), TransportError> {
        self.socket
            .send_to(data, peer)
            .await
            .map_err(TransportError::SendFailed)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UdpClientSocket
// ---------------------------------------------------------------------------

/// A connected client socket.
///
/// The local port is OS-assigned, so every `UdpClientSocket` is a distinct
/// endpoint from the broker's point of view. Once connected, `recv` only
/// accepts datagrams from the associated peer; stray traffic from other
/// hosts is filtered by the kernel.
pub struct UdpClientSocket {
    socket: UdpSocket,
}

impl UdpClientSocket {
    /// Binds an ephemeral local socket and associates it with `addr`.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(TransportError::BindFailed)?;
        socket
            .connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        Ok(Self { socket })
    }

    /// Returns the local address the socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Sends one datagram to the associated peer.
    pub async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.socket
            .send(data)
            .await
            .map_err(TransportError::SendFailed)?;
        Ok(())
    }

    /// Waits up to `wait` for the next datagram from the associated peer.
    ///
    /// # Errors
    /// [`TransportError::Timeout`] if nothing arrives in time.
    pub async fn recv(&self, wait: Duration) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let len = tokio::time::timeout(wait, self.socket.recv(&mut buf))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(TransportError::ReceiveFailed)?;
        buf.truncate(len);
        Ok(buf)
    }
}
