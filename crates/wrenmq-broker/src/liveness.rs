//! Missed-heartbeat liveness tracking.
//!
//! A connectionless transport gives no disconnect event, so the broker
//! cannot learn that a client is gone from send failures alone. Instead
//! every inbound request refreshes its endpoint's `last seen` mark, and a
//! periodic sweep declares endpoints lost once they have been silent for
//! longer than the grace period. The server then tears their
//! subscriptions down via
//! [`RequestHandler::remove_endpoint`](crate::RequestHandler::remove_endpoint).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::Endpoint;

/// Tracks when each endpoint was last heard from.
pub struct ClientLiveness {
    last_seen: HashMap<Endpoint, Instant>,
    grace: Duration,
}

impl ClientLiveness {
    pub fn new(grace: Duration) -> Self {
        Self {
            last_seen: HashMap::new(),
            grace,
        }
    }

    /// Marks an endpoint as alive right now.
    ///
    /// Any datagram counts, not just heartbeats; a subscribe or publish
    /// proves the sender is there just as well.
    pub fn touch(&mut self, endpoint: Endpoint) {
        self.last_seen.insert(endpoint, Instant::now());
    }

    /// Removes and returns every endpoint silent for longer than the
    /// grace period.
    pub fn expire_stale(&mut self) -> Vec<Endpoint> {
        let grace = self.grace;
        let mut stale = Vec::new();
        self.last_seen.retain(|endpoint, seen| {
            if seen.elapsed() > grace {
                stale.push(*endpoint);
                false
            } else {
                true
            }
        });
        for endpoint in &stale {
            tracing::info!(%endpoint, "client silent past grace period");
        }
        stale
    }

    /// Number of endpoints currently tracked.
    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
