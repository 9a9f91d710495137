//! Broker configuration.

use std::time::Duration;

/// Settings for a broker instance.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Address the UDP socket binds to. Port 5683 is the conventional
    /// CoAP port; use `:0` in tests to let the OS pick.
    pub bind_addr: String,

    /// How long an endpoint may stay silent before it is declared lost
    /// and its subscriptions are dropped. Must comfortably exceed the
    /// clients' heartbeat interval.
    pub liveness_grace: Duration,

    /// How often the liveness sweep runs.
    pub sweep_interval: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5683".to_string(),
            liveness_grace: Duration::from_secs(90),
            sweep_interval: Duration::from_secs(30),
        }
    }
}
