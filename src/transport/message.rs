//! Websocket frames
//!
//! Every frame is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Broadcasts `"<client ip>: ping"` to everyone and answers with `pong`.
    #[serde(rename = "ping")]
    Ping,

    /// Broadcasts `payload` to everyone.
    #[serde(rename = "publish")]
    Publish { payload: String },
}

/// Frames the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// A message delivered by the hub.
    #[serde(rename = "message")]
    Message { data: String },

    #[serde(rename = "pong")]
    Pong,

    #[serde(rename = "error")]
    Error { message: String },
}
