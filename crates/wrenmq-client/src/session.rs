//! The client session: one-shot requests, subscriptions, heartbeats.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use wrenmq_protocol::{Command, CommandKind, MessageKind, MessageSequence};

use crate::conn::{check_response, Exchange};
use crate::{ClientError, SessionConfig, Subscription};

// ---------------------------------------------------------------------------
// Session events
// ---------------------------------------------------------------------------

/// Out-of-band notifications from a session's background work.
#[derive(Debug)]
pub enum SessionEvent {
    /// A heartbeat went unanswered. The broker is considered lost; the
    /// heartbeat loop has stopped. What to do next (retry, reconnect,
    /// shut down) is the owner's decision.
    BrokerLost(ClientError),
}

/// Receives [`SessionEvent`]s for one session.
///
/// Returned by [`Session::connect`] so callers hold an explicit handle to
/// the otherwise-invisible background loops.
pub struct SessionMonitor {
    events: mpsc::Receiver<SessionEvent>,
}

impl SessionMonitor {
    /// Waits for the next session event.
    ///
    /// Returns `None` after the session has been closed.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One active subscription's bookkeeping.
struct SubEntry {
    /// The socket the subscription registered on. Its local address is
    /// this subscription's identity at the broker, so keepalives and the
    /// eventual deregistration must go out through it.
    exchange: Arc<Exchange>,
    /// Shared receive side handed out to [`Subscription`] handles.
    receiver: Arc<Mutex<mpsc::Receiver<String>>>,
    /// The listen loop, kept so `close` can stop it without a round trip.
    task: JoinHandle<()>,
}

/// The subscription table. Mutated by callers (subscribe/unsubscribe),
/// read by every listen loop; presence of a topic here is the one and only
/// authority for "am I subscribed".
type SubTable = Arc<Mutex<HashMap<String, SubEntry>>>;

/// A pub/sub session bound to one broker address.
pub struct Session {
    broker_addr: String,
    config: SessionConfig,
    sequence: Arc<MessageSequence>,
    subscriptions: SubTable,
    heartbeat: JoinHandle<()>,
}

impl Session {
    /// Connects to a broker.
    ///
    /// Performs an initial liveness probe (a heartbeat request) and
    /// fails construction if the broker does not answer. On success the
    /// background heartbeat loop is started and a [`SessionMonitor`] is
    /// returned alongside the session.
    pub async fn connect(
        broker_addr: &str,
        config: SessionConfig,
    ) -> Result<(Session, SessionMonitor), ClientError> {
        let sequence = Arc::new(MessageSequence::new());

        probe(broker_addr, &config, &sequence).await?;
        tracing::info!(broker = broker_addr, "broker answered liveness probe");

        let subscriptions: SubTable = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::channel(1);

        let heartbeat = tokio::spawn(heartbeat_loop(
            broker_addr.to_string(),
            config.clone(),
            Arc::clone(&sequence),
            Arc::clone(&subscriptions),
            event_tx,
        ));

        Ok((
            Session {
                broker_addr: broker_addr.to_string(),
                config,
                sequence,
                subscriptions,
                heartbeat,
            },
            SessionMonitor { events: event_rx },
        ))
    }

    // -----------------------------------------------------------------------
    // One-shot operations
    // -----------------------------------------------------------------------

    /// Publishes a value to a topic.
    pub async fn publish(
        &self,
        topic: &str,
        data: &str,
    ) -> Result<(), ClientError> {
        self.one_shot(Command::publish(topic, data), "publish")
            .await
            .map(|_| ())
    }

    /// Creates a topic on the broker.
    pub async fn create_topic(&self, topic: &str) -> Result<(), ClientError> {
        self.one_shot(Command::create(topic), "create topic")
            .await
            .map(|_| ())
    }

    /// Removes a topic (and all its subscriptions) on the broker.
    pub async fn remove_topic(&self, topic: &str) -> Result<(), ClientError> {
        self.one_shot(Command::remove(topic), "remove topic")
            .await
            .map(|_| ())
    }

    /// Reads a topic's latest value.
    pub async fn read_topic(&self, topic: &str) -> Result<String, ClientError> {
        let response =
            self.one_shot(Command::read(topic), "read topic").await?;
        Ok(String::from_utf8_lossy(&response.payload).into_owned())
    }

    /// Queries the broker for topics matching a filter.
    ///
    /// Extension point: the filter grammar is not specified yet, so this
    /// always fails rather than sending a request the broker would reject.
    pub async fn discover_topics(
        &self,
        _filter: &str,
    ) -> Result<String, ClientError> {
        Err(ClientError::Unsupported("topic discovery"))
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Subscribes to a topic and returns the receive handle.
    ///
    /// Idempotent per topic: if this session is already subscribed, the
    /// existing channel is handed back without contacting the broker.
    pub async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<Subscription, ClientError> {
        if let Some(entry) = self.subscriptions.lock().await.get(topic) {
            return Ok(Subscription::new(topic, &entry.receiver));
        }

        // Register with the broker on a socket dedicated to this
        // subscription; its local address is what the broker will push to.
        let exchange =
            Exchange::connect(&self.broker_addr, self.config.request_timeout)
                .await?;
        let response = exchange
            .request(&self.sequence, &Command::subscribe(topic))
            .await?;
        check_response(&response, "subscribe")?;

        let exchange = Arc::new(exchange);
        let (tx, rx) = mpsc::channel(1);
        let receiver = Arc::new(Mutex::new(rx));

        let mut table = self.subscriptions.lock().await;
        if let Some(existing) = table.get(topic) {
            // A concurrent subscribe to the same topic won the race while
            // we were talking to the broker. Its channel is the
            // subscription; ours is abandoned (the broker-side duplicate
            // registration ages out with this socket's liveness).
            return Ok(Subscription::new(topic, &existing.receiver));
        }

        // The entry enters the table before the loop can observe anything:
        // the table lock is held across spawn + insert, so the loop's
        // first termination check cannot run against a map we haven't
        // updated yet.
        let task = tokio::spawn(listen_loop(
            topic.to_string(),
            Arc::clone(&exchange),
            tx,
            Arc::clone(&self.subscriptions),
        ));
        table.insert(
            topic.to_string(),
            SubEntry {
                exchange,
                receiver: Arc::clone(&receiver),
                task,
            },
        );
        drop(table);

        tracing::info!(topic, "subscribed");
        Ok(Subscription::new(topic, &receiver))
    }

    /// Unsubscribes from a topic.
    ///
    /// A topic this session never subscribed to is a no-op, not an error.
    /// The table entry is removed before the deregistration request goes
    /// out: entry removal is what the listen loop observes, so it
    /// terminates even when the broker is unreachable.
    pub async fn unsubscribe(&self, topic: &str) -> Result<(), ClientError> {
        let Some(entry) = self.subscriptions.lock().await.remove(topic)
        else {
            return Ok(());
        };

        // Deregister from the subscription's own socket: the broker
        // indexed that address, not the session's. Fire-and-forget: the
        // acknowledgement would land in the listen loop's receive, and
        // the broker tolerates redundant deregistration anyway.
        let result = entry
            .exchange
            .send(&self.sequence, &Command::unsubscribe(topic))
            .await;

        tracing::info!(topic, "unsubscribed");
        result
    }

    /// Returns `true` if this session currently holds a subscription to
    /// the topic.
    pub async fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.lock().await.contains_key(topic)
    }

    /// Stops all background work: the heartbeat loop and every listen
    /// loop. Deterministic shutdown for programs and tests; broker-side
    /// subscriptions are left to liveness expiry.
    pub async fn close(self) {
        self.heartbeat.abort();
        let mut table = self.subscriptions.lock().await;
        for (topic, entry) in table.drain() {
            entry.task.abort();
            tracing::debug!(topic, "listen loop stopped");
        }
    }

    async fn one_shot(
        &self,
        command: Command,
        context: &'static str,
    ) -> Result<wrenmq_protocol::Message, ClientError> {
        let exchange =
            Exchange::connect(&self.broker_addr, self.config.request_timeout)
                .await?;
        let response = exchange.request(&self.sequence, &command).await?;
        check_response(&response, context)?;
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Background loops
// ---------------------------------------------------------------------------

/// One probe: fresh exchange, heartbeat request, acknowledged or error.
async fn probe(
    broker_addr: &str,
    config: &SessionConfig,
    sequence: &MessageSequence,
) -> Result<(), ClientError> {
    let exchange =
        Exchange::connect(broker_addr, config.request_timeout).await?;
    let response = exchange.request(sequence, &Command::heartbeat()).await?;
    check_response(&response, "heartbeat")
}

/// The session's heartbeat loop.
///
/// Each tick does two things. First it fires a keepalive through every
/// subscription's socket; those addresses are what NAT mappings and the
/// broker's liveness tracking know, and a socket that never sends goes
/// stale on both counts. Then it probes the broker on a fresh exchange;
/// an unanswered probe is fatal to the loop and reported once through the
/// monitor.
async fn heartbeat_loop(
    broker_addr: String,
    config: SessionConfig,
    sequence: Arc<MessageSequence>,
    subscriptions: SubTable,
    events: mpsc::Sender<SessionEvent>,
) {
    let mut ticker = tokio::time::interval(config.heartbeat_interval);
    // The first tick fires immediately; construction just probed.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let keepalives: Vec<(String, Arc<Exchange>)> = {
            let table = subscriptions.lock().await;
            table
                .iter()
                .map(|(topic, entry)| {
                    (topic.clone(), Arc::clone(&entry.exchange))
                })
                .collect()
        };
        for (topic, exchange) in keepalives {
            if let Err(e) =
                exchange.send(&sequence, &Command::heartbeat()).await
            {
                tracing::debug!(topic, error = %e, "keepalive send failed");
            }
        }

        match probe(&broker_addr, &config, &sequence).await {
            Ok(()) => tracing::trace!("heartbeat acknowledged"),
            Err(e) => {
                tracing::warn!(error = %e, "heartbeat unanswered, broker lost");
                let _ = events.send(SessionEvent::BrokerLost(e)).await;
                return;
            }
        }
    }
}

/// The per-subscription listen loop.
///
/// Blocks on the subscription's socket for server pushes; each received
/// publish is delivered into the bounded channel, which may wait until the
/// consumer takes the previous value. After every iteration, whether it
/// delivered, timed out, or errored, the loop consults the subscription table;
/// the topic's absence is the only thing that stops it. A silent or
/// crashed broker just means more timeouts, never termination.
async fn listen_loop(
    topic: String,
    exchange: Arc<Exchange>,
    tx: mpsc::Sender<String>,
    subscriptions: SubTable,
) {
    tracing::debug!(topic, "listen loop started");
    loop {
        match exchange.receive().await {
            Ok(message) => {
                // Keepalive acknowledgements and other non-request
                // traffic on this socket are not pushes; skip them.
                if message.kind == MessageKind::Confirmable {
                    match Command::decode(&message) {
                        Ok(command)
                            if command.kind == CommandKind::Publish =>
                        {
                            if tx.send(command.payload).await.is_err() {
                                tracing::debug!(
                                    topic,
                                    "all receive handles dropped"
                                );
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!(topic, error = %e, "bad push")
                        }
                    }
                }
            }
            Err(e) => {
                tracing::trace!(topic, error = %e, "no push this interval");
            }
        }

        if !subscriptions.lock().await.contains_key(&topic) {
            break;
        }
    }
    tracing::debug!(topic, "listen loop terminated");
}
