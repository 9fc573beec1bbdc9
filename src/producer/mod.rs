//! The `producer` module holds the publishers that run alongside the hub.
//!
//! Producers only ever see a [`Publisher`](crate::hub::Publisher); they have
//! no access to the subscriber registry.

pub mod heartbeat;

pub use heartbeat::run_heartbeat;

#[cfg(test)]
mod tests;
