use thiserror::Error;

/// Errors produced by the monitor subsystem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// Listener names are registry keys and must not be empty.
    #[error("listener name must not be empty")]
    EmptyListenerName,

    /// The event queue was closed; the monitor is shutting down.
    #[error("event queue is closed")]
    QueueClosed,
}

/// Convenience alias used throughout the monitor crate.
pub type MonitorResult<T> = Result<T, MonitorError>;
