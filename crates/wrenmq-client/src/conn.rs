//! One client-side exchange: a dedicated socket plus the codec.
//!
//! Mirrors the dial-per-request shape of the protocol: every one-shot
//! operation opens its own [`Exchange`], and every subscription keeps one
//! alive for the lifetime of its listen loop. The broker identifies
//! subscribers by the exchange's local address, so a subscription's
//! deregistration must leave from the same exchange it registered on.

use std::time::Duration;

use wrenmq_protocol::{
    Codec, Command, JsonCodec, Message, MessageKind, MessageSequence,
};
use wrenmq_transport::UdpClientSocket;

use crate::ClientError;

/// A connected socket paired with the wire codec.
pub(crate) struct Exchange {
    socket: UdpClientSocket,
    codec: JsonCodec,
    wait: Duration,
}

impl Exchange {
    /// Opens a fresh exchange to the broker.
    pub(crate) async fn connect(
        broker_addr: &str,
        wait: Duration,
    ) -> Result<Self, ClientError> {
        let socket = UdpClientSocket::connect(broker_addr).await?;
        Ok(Self {
            socket,
            codec: JsonCodec,
            wait,
        })
    }

    /// Sends a request and waits for its acknowledgement.
    ///
    /// Correlation is by message ID; unrelated datagrams that arrive in
    /// the meantime are skipped. The wait is bounded by the configured
    /// request timeout; retransmission is the transport collaborator's
    /// business, not ours.
    pub(crate) async fn request(
        &self,
        sequence: &MessageSequence,
        command: &Command,
    ) -> Result<Message, ClientError> {
        let message_id = sequence.next_id();
        let request = command.encode(message_id);
        self.socket.send(&self.codec.encode(&request)?).await?;

        loop {
            let data = self.socket.recv(self.wait).await?;
            let response: Message = self.codec.decode(&data)?;
            if response.kind == MessageKind::Acknowledgement
                && response.message_id == message_id
            {
                return Ok(response);
            }
            tracing::trace!(
                got = response.message_id,
                want = message_id,
                "skipping unrelated datagram"
            );
        }
    }

    /// Sends a request without waiting for any reply.
    ///
    /// Used where the acknowledgement would race with a listen loop's
    /// receive on the same socket (subscription keepalives and
    /// deregistration).
    pub(crate) async fn send(
        &self,
        sequence: &MessageSequence,
        command: &Command,
    ) -> Result<(), ClientError> {
        let request = command.encode(sequence.next_id());
        self.socket.send(&self.codec.encode(&request)?).await?;
        Ok(())
    }

    /// Waits for the next server-pushed message on this exchange.
    pub(crate) async fn receive(&self) -> Result<Message, ClientError> {
        let data = self.socket.recv(self.wait).await?;
        Ok(self.codec.decode(&data)?)
    }
}

/// Maps a failure-family acknowledgement onto a descriptive error.
pub(crate) fn check_response(
    response: &Message,
    context: &'static str,
) -> Result<(), ClientError> {
    if response.code.is_success() {
        Ok(())
    } else {
        Err(ClientError::Rejected {
            context,
            code: response.code,
        })
    }
}
