//! Error type shared by the timing components.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimingError {
    /// A tick produced callbacks before [`Timing::initialize`](crate::Timing::initialize)
    /// installed the outbound sink.
    #[error("timers sink is not initialized")]
    SinkNotInitialized,
    /// The dispatcher was destroyed and can no longer attach to the clock.
    #[error("frame dispatcher has been destroyed")]
    Destroyed,
    #[error("invalid timing config: {0}")]
    InvalidConfig(String),
    /// A registered listener failed while handling a tick.
    #[error("listener '{listener}' failed: {message}")]
    Listener { listener: String, message: String },
}
