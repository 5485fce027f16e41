//! Error types for the behavior engine.
//!
//! Configuration problems that the simulation can survive (a duplicated
//! actuator, a target that cannot be found this frame) are logged instead of
//! returned. [`BehaviorError`] covers the cases a caller has to react to:
//! subscription bookkeeping bugs and definition/config loading failures.

use thiserror::Error;

/// Errors returned by the behavior engine.
#[derive(Debug, Error)]
pub enum BehaviorError {
    /// `unsubscribe` was called on a source with no active subscribers.
    #[error("attempted to remove a subscriber when there are none")]
    SubscriptionUnderflow,

    /// `unsubscribe` was called with a key that was never subscribed.
    #[error("subscriber {0} is not registered on this source")]
    UnknownSubscriber(String),

    /// An agent definition references something that does not exist.
    #[error("invalid agent definition: {0}")]
    Definition(String),

    /// The simulation config file could not be loaded or saved.
    #[error("config error: {0}")]
    Config(String),

    /// IO errors while reading definition files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse errors in definition files
    #[error("failed to parse agent definitions: {0}")]
    Json(#[from] serde_json::Error),
}
