//! Session configuration.

use std::time::Duration;

/// Settings for a client session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a one-shot request waits for its acknowledgement before
    /// giving up. Also bounds each blocking receive in the listen loops.
    pub request_timeout: Duration,

    /// Pause between heartbeats. Must stay below typical NAT/firewall UDP
    /// mapping expiry (commonly around a minute) or pushes stop arriving.
    pub heartbeat_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}
