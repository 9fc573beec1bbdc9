//! The `error` module defines the error types used within `streamhub`.
//!
//! The hub's public operations (`register`, `deregister`, `publish`) are
//! fire-and-forget and return no error. The types below describe the
//! failures that are still worth naming: a stopped worker, a double close,
//! a stalled delivery, and the fallible edges of the server and client.

use std::time::Duration;

use config::ConfigError;
use thiserror::Error;

/// Failures reported by the hub itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    /// The worker loop has exited and no longer accepts commands.
    #[error("hub worker is not running")]
    Stopped,

    /// A subscriber queue was asked to close a second time.
    #[error("subscriber is already closed")]
    AlreadyClosed,
}

/// Why a single delivery to a subscriber did not complete.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving half of the queue was dropped.
    #[error("subscriber inbox was dropped")]
    Disconnected,

    /// The queue stayed full for longer than the eviction timeout.
    #[error("subscriber did not accept the message within {0:?}")]
    TimedOut(Duration),

    /// The hub was cancelled while the delivery was pending.
    #[error("delivery cancelled by hub shutdown")]
    Cancelled,
}

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by [`EventClient`](crate::client::EventClient).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),
}
