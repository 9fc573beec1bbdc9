//! Scoped subscriptions
//!
//! `Subscription` is what a stream adapter holds for one live connection.
//! It owns the inbox of a registered queue and deregisters it exactly once
//! when dropped, whichever way the connection ends.

use crate::hub::engine::Hub;
use crate::hub::message::Message;
use crate::hub::subscriber::{Inbox, SubscriberHandle};

#[derive(Debug)]
pub struct Subscription {
    inbox: Inbox,
    hub: Hub,
}

impl Subscription {
    pub(crate) fn new(inbox: Inbox, hub: Hub) -> Self {
        Self { inbox, hub }
    }

    /// Next message delivered by the hub, or `None` once the hub has closed
    /// this subscription (eviction or shutdown).
    pub async fn recv(&mut self) -> Option<Message> {
        self.inbox.recv().await
    }

    pub fn handle(&self) -> &SubscriberHandle {
        self.inbox.handle()
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }

    /// Explicitly ends the subscription. Equivalent to dropping it.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // A closed queue has already been removed from the registry.
        if !self.inbox.is_closed() {
            self.hub.deregister(self.inbox.handle().clone());
        }
    }
}
