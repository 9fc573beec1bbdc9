//! # streamhub
//!
//! `streamhub` streams server-generated events to every connected client.
//! Any number of producers publish text messages into a single broadcast
//! hub, which fans each one out to the clients connected at that moment.
//!
//! ## Core Modules
//!
//! - `hub`: the broadcast authority. A single worker task owns the set of
//!   subscriber queues and serializes register, deregister and publish.
//! - `producer`: publishers running beside the hub, such as the heartbeat.
//! - `transport`: the websocket server that turns connections into hub
//!   subscriptions.
//! - `client`: a websocket client for the server.
//! - `config`: loading server configuration.
//! - `utils`: error types and logging setup.

pub mod client;
pub mod config;
pub mod hub;
pub mod producer;
pub mod transport;
pub mod utils;
