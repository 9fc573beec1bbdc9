//! The `transport` module bridges network connections to the hub.
//!
//! It defines the JSON frames exchanged with clients and the websocket
//! server that turns each connection into a hub subscription.

pub mod message;
pub mod websocket;

pub use message::{ClientMessage, ServerMessage};
pub use websocket::{serve, start_websocket_server};
