//! Subscriber queues
//!
//! A subscriber is nothing more than a bounded queue. [`channel`] creates
//! one and splits it into two halves:
//! - [`Subscriber`]: the sending half. It is moved into the hub on register
//!   and is the only sender the queue ever has, so closing it (dropping it)
//!   closes the queue.
//! - [`Inbox`]: the receiving half, kept by whoever drains the queue.
//!
//! Both halves share a [`SubscriberHandle`], which is the queue's identity.
//! Handles compare and hash by pointer; there is no separate id.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::hub::message::Message;
use crate::utils::error::{DeliveryError, HubError};

#[derive(Debug, Default)]
struct QueueState {
    closed: AtomicBool,
}

/// Identity of one subscriber queue.
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    state: Arc<QueueState>,
}

impl SubscriberHandle {
    /// Whether the hub has closed this queue.
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// One-shot close guard. Returns `true` only for the first caller.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.state.closed.swap(true, Ordering::AcqRel)
    }
}

impl PartialEq for SubscriberHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for SubscriberHandle {}

impl Hash for SubscriberHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.state), state);
    }
}

/// Sending half of a subscriber queue. Owned by the hub's registry once
/// registered.
#[derive(Debug)]
pub struct Subscriber {
    handle: SubscriberHandle,
    tx: mpsc::Sender<Message>,
}

impl Subscriber {
    pub fn handle(&self) -> &SubscriberHandle {
        &self.handle
    }

    /// `true` once the matching [`Inbox`] has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.tx.is_closed()
    }

    /// Waits for room in the queue, then enqueues `message`.
    pub(crate) async fn send(&self, message: Message) -> Result<(), DeliveryError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| DeliveryError::Disconnected)
    }

    /// Closes the queue by dropping the only sender. The inbox drains what
    /// is already buffered and then reports end of stream.
    pub(crate) fn close(self) -> Result<(), HubError> {
        if self.handle.mark_closed() {
            Ok(())
        } else {
            Err(HubError::AlreadyClosed)
        }
    }
}

/// Receiving half of a subscriber queue.
#[derive(Debug)]
pub struct Inbox {
    handle: SubscriberHandle,
    rx: mpsc::Receiver<Message>,
}

impl Inbox {
    pub fn handle(&self) -> &SubscriberHandle {
        &self.handle
    }

    /// Next delivered message, or `None` once the hub has closed the queue
    /// and everything buffered has been read.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Message, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

/// Creates a subscriber queue holding at most `capacity` undelivered
/// messages. A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (Subscriber, Inbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = SubscriberHandle {
        state: Arc::new(QueueState::default()),
    };

    (
        Subscriber {
            handle: handle.clone(),
            tx,
        },
        Inbox { handle, rx },
    )
}
