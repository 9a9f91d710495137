//! Request dispatch: from a decoded wire message to an acknowledgement
//! plus any fan-out sends.
//!
//! The handler is where the protocol's response-code contract lives:
//! which registry outcome maps to which code, and what a malformed
//! request gets back. It owns the registry behind the single lock and
//! never performs I/O; the returned [`Dispatch`] tells the server what
//! to put on the wire.

use tokio::sync::Mutex;

use wrenmq_protocol::{
    Code, Command, CommandKind, Message, MessageSequence,
};

use crate::{Endpoint, Subscribed, TopicRegistry};

/// What the server should send after handling one request: the
/// acknowledgement for the sender, and zero or more PUBLISH messages for
/// the topic's subscribers. Fan-out sends are independent of each other
/// and of the acknowledgement; a slow endpoint must never delay the rest.
#[derive(Debug)]
pub struct Dispatch {
    pub response: Message,
    pub fanout: Vec<(Endpoint, Message)>,
}

impl Dispatch {
    fn reply(response: Message) -> Self {
        Self {
            response,
            fanout: Vec::new(),
        }
    }
}

/// Dispatches decoded requests against the topic registry.
pub struct RequestHandler {
    /// The single mutual-exclusion domain for all registry state. Every
    /// read-modify-write, including the already-subscribed check inside
    /// [`TopicRegistry::subscribe`], happens under one acquisition.
    registry: Mutex<TopicRegistry>,

    /// Message-ID source for broker-originated PUBLISH messages.
    sequence: MessageSequence,
}

impl RequestHandler {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(TopicRegistry::new()),
            sequence: MessageSequence::new(),
        }
    }

    /// Handles one inbound request from `endpoint`.
    ///
    /// Never fails: malformed input becomes a Bad Request acknowledgement
    /// and registry policy violations become failure-family codes. The
    /// remote peer can always be answered.
    pub async fn handle(&self, endpoint: Endpoint, request: &Message) -> Dispatch {
        let command = match Command::decode(request) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(%endpoint, error = %e, "malformed request");
                return Dispatch::reply(request.ack(Code::BadRequest, Vec::new()));
            }
        };

        tracing::debug!(
            %endpoint,
            kind = ?command.kind,
            topic = %command.topic,
            "request"
        );

        let mut fanout = Vec::new();
        let mut payload = Vec::new();

        let code = {
            let mut registry = self.registry.lock().await;
            match command.kind {
                CommandKind::Subscribe => {
                    match registry.subscribe(&command.topic, endpoint) {
                        Subscribed::Inserted => Code::Created,
                        // Idempotent re-subscribe: success, but visibly
                        // not a fresh registration.
                        Subscribed::Already => Code::Changed,
                    }
                }
                CommandKind::Unsubscribe => {
                    registry.unsubscribe(&command.topic, &endpoint);
                    Code::Deleted
                }
                CommandKind::Publish => {
                    let subscribers =
                        registry.publish(&command.topic, &command.payload);
                    fanout = self.fan_out(&command, subscribers);
                    Code::Changed
                }
                CommandKind::Create => {
                    match registry.create_topic(&command.topic) {
                        Ok(()) => Code::Created,
                        Err(e) => {
                            tracing::debug!(%endpoint, error = %e, "create rejected");
                            Code::Forbidden
                        }
                    }
                }
                CommandKind::Read => match registry.read_topic(&command.topic) {
                    Ok(value) => {
                        payload = value.as_bytes().to_vec();
                        Code::Content
                    }
                    Err(e) => {
                        tracing::debug!(%endpoint, error = %e, "read rejected");
                        Code::NotFound
                    }
                },
                CommandKind::Remove => {
                    registry.remove_topic(&command.topic);
                    Code::Deleted
                }
                CommandKind::Heartbeat => Code::Content,
                // Discovery is an extension point with no filter grammar
                // yet; invalid commands get the same answer.
                CommandKind::Discover | CommandKind::Invalid => Code::BadRequest,
            }
        };

        Dispatch {
            response: request.ack(code, payload),
            fanout,
        }
    }

    /// Drops every subscription held by `endpoint`. Called by the liveness
    /// sweep when a client is declared lost.
    pub async fn remove_endpoint(&self, endpoint: &Endpoint) {
        self.registry.lock().await.remove_subscriptions_for(endpoint);
    }

    /// Re-encodes a publish for each subscriber, each with a fresh
    /// message ID.
    fn fan_out(
        &self,
        command: &Command,
        subscribers: Vec<Endpoint>,
    ) -> Vec<(Endpoint, Message)> {
        subscribers
            .into_iter()
            .map(|subscriber| {
                let push = Command::publish(&command.topic, &command.payload)
                    .encode(self.sequence.next_id());
                tracing::debug!(
                    topic = %command.topic,
                    %subscriber,
                    "fan-out publish"
                );
                (subscriber, push)
            })
            .collect()
    }
}

impl Default for RequestHandler {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
