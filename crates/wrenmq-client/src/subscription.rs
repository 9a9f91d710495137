//! The receive handle a subscriber holds.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

/// Receives values pushed for one subscribed topic.
///
/// The channel behind this handle holds at most one value: delivery of the
/// next publish waits until the previous one has been taken. That caps
/// in-flight deliveries at one per subscription: deliberate backpressure,
/// not an implementation accident.
///
/// Cloning is cheap and every clone reads from the same channel, which is
/// what makes `Session::subscribe` idempotent: a second subscribe to the
/// same topic hands back another handle to the existing channel.
#[derive(Clone)]
pub struct Subscription {
    topic: String,
    receiver: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl Subscription {
    pub(crate) fn new(
        topic: &str,
        receiver: &Arc<Mutex<mpsc::Receiver<String>>>,
    ) -> Self {
        Self {
            topic: topic.to_string(),
            receiver: Arc::clone(receiver),
        }
    }

    /// The topic this subscription delivers.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next published value.
    ///
    /// Returns `None` once the subscription has been unsubscribed and any
    /// buffered value has been drained.
    pub async fn recv(&self) -> Option<String> {
        self.receiver.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recv_yields_values_in_order() {
        let (tx, rx) = mpsc::channel(1);
        let subscription =
            Subscription::new("t", &Arc::new(Mutex::new(rx)));

        tx.send("first".to_string()).await.unwrap();
        assert_eq!(subscription.recv().await.as_deref(), Some("first"));

        tx.send("second".to_string()).await.unwrap();
        assert_eq!(subscription.recv().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_sender_drops() {
        let (tx, rx) = mpsc::channel(1);
        let subscription =
            Subscription::new("t", &Arc::new(Mutex::new(rx)));
        drop(tx);
        assert_eq!(subscription.recv().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_one_channel() {
        let (tx, rx) = mpsc::channel(1);
        let a = Subscription::new("t", &Arc::new(Mutex::new(rx)));
        let b = a.clone();

        tx.send("only one handle sees this".to_string()).await.unwrap();
        assert!(a.recv().await.is_some());
        drop(tx);
        assert_eq!(b.recv().await, None);
    }
}
