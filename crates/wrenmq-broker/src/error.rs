//! Error types for the broker core.

/// Registry policy errors.
///
/// These are remote-facing outcomes, not local faults: each maps onto a
/// failure response code (`Forbidden`, `Not Found`) and is surfaced to the
/// requesting client, never crashing the handler.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// An explicit create named a topic that already exists.
    #[error("topic {0:?} already exists")]
    TopicExists(String),

    /// A read named a topic that was never created or published to.
    #[error("topic {0:?} not found")]
    TopicNotFound(String),
}
