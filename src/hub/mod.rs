//! The `hub` module is the broadcast authority: it owns the set of live
//! subscriber queues and fans published messages out to them.

pub mod engine;
pub mod message;
pub mod subscriber;
pub mod subscription;

pub use engine::{DeliveryPolicy, Hub, HubConfig, HubStats, Publisher};
pub use message::Message;
pub use subscriber::{Inbox, Subscriber, SubscriberHandle, channel};
pub use subscription::Subscription;
