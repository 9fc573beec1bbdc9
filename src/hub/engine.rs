//! Hub engine
//!
//! This module contains the broadcast hub responsible for:
//! - keeping the registry of live subscriber queues
//! - registering and deregistering subscribers
//! - fanning every published message out to the current registry
//!
//! Concurrency and usage notes:
//! - The registry is owned by a single worker task. [`Hub`] and
//!   [`Publisher`] are cheap handles that only enqueue commands for it, so
//!   no lock guards the registry and no caller ever touches it.
//! - Register, deregister, publish and stats requests share one FIFO
//!   queue. The worker takes one command at a time and runs it to
//!   completion, broadcast included, before reading the next.
//! - Under [`DeliveryPolicy::Block`] a subscriber whose queue is full and
//!   not being drained stalls the worker: every other subscriber and every
//!   pending register/deregister waits behind it.
//!   [`DeliveryPolicy::Evict`] bounds that wait and drops the offender.
//! - At most [`HubConfig::publish_capacity`] publishes are queued or being
//!   broadcast at once. `publish` waits for a free slot, so during a stall
//!   producers wait with it instead of piling messages up in memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::hub::message::Message;
use crate::hub::subscriber::{self, Subscriber, SubscriberHandle};
use crate::hub::subscription::Subscription;
use crate::utils::error::{DeliveryError, HubError};

/// What the worker does when a subscriber's queue has no room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Wait until the subscriber makes room, however long that takes.
    #[default]
    Block,
    /// Wait at most `timeout`, then remove and close the subscriber.
    Evict { timeout: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Messages each subscriber queue can buffer before delivery waits.
    pub subscriber_capacity: usize,
    pub delivery: DeliveryPolicy,
    /// Publishes that may be queued or in flight before `publish` waits.
    pub publish_capacity: usize,
}

impl HubConfig {
    pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1;
    pub const DEFAULT_PUBLISH_CAPACITY: usize = 64;
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: Self::DEFAULT_SUBSCRIBER_CAPACITY,
            delivery: DeliveryPolicy::Block,
            publish_capacity: Self::DEFAULT_PUBLISH_CAPACITY,
        }
    }
}

/// Counters reported by [`Hub::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Subscribers currently in the registry.
    pub subscribers: usize,
    /// Publish commands processed, including those with nobody listening.
    pub published: u64,
    /// Individual messages handed to subscriber queues.
    pub delivered: u64,
    /// Subscribers removed for not accepting a delivery in time.
    pub evicted: u64,
    /// Deregistrations for subscribers that were not in the registry.
    pub ignored_deregistrations: u64,
}

#[derive(Debug)]
enum Command {
    Register(Subscriber),
    Deregister(SubscriberHandle),
    /// The permit is released once the broadcast has finished.
    Publish(Message, OwnedSemaphorePermit),
    Stats(oneshot::Sender<HubStats>),
}

impl Command {
    fn kind(&self) -> &'static str {
        match self {
            Command::Register(_) => "register",
            Command::Deregister(_) => "deregister",
            Command::Publish(..) => "publish",
            Command::Stats(_) => "stats",
        }
    }
}

fn dispatch(commands: &mpsc::UnboundedSender<Command>, command: Command) {
    if let Err(mpsc::error::SendError(command)) = commands.send(command) {
        warn!("Hub worker stopped; dropping {} command", command.kind());
        if let Command::Register(subscriber) = command {
            // Still close it, so the owner's inbox ends instead of idling.
            let _ = subscriber.close();
        }
    }
}

/// Handle to the broadcast hub. Cloning it is cheap; every clone talks to
/// the same worker.
#[derive(Debug, Clone)]
pub struct Hub {
    commands: mpsc::UnboundedSender<Command>,
    publish_slots: Arc<Semaphore>,
    subscriber_capacity: usize,
}

impl Hub {
    /// Spawns the worker loop and returns a handle to it together with the
    /// worker's join handle. The worker runs until `cancel` fires.
    pub fn start(config: HubConfig, cancel: CancellationToken) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber_capacity = config.subscriber_capacity.max(1);
        let publish_slots = Arc::new(Semaphore::new(config.publish_capacity.max(1)));

        let worker = HubWorker {
            registry: HashMap::new(),
            commands: rx,
            publish_slots: publish_slots.clone(),
            delivery: config.delivery,
            cancel,
            stats: HubStats::default(),
        };
        let join = tokio::spawn(worker.run());

        (
            Self {
                commands: tx,
                publish_slots,
                subscriber_capacity,
            },
            join,
        )
    }

    /// Adds `subscriber` to the registry.
    pub fn register(&self, subscriber: Subscriber) {
        dispatch(&self.commands, Command::Register(subscriber));
    }

    /// Removes the subscriber identified by `handle` and closes its queue.
    /// Unknown handles are ignored by the worker and counted in
    /// [`HubStats::ignored_deregistrations`].
    pub fn deregister(&self, handle: SubscriberHandle) {
        dispatch(&self.commands, Command::Deregister(handle));
    }

    /// Broadcasts `message` to every subscriber registered at the moment the
    /// worker reaches this command. Waits while `publish_capacity`
    /// publishes are already pending.
    pub async fn publish(&self, message: impl Into<Message>) {
        enqueue_publish(&self.commands, &self.publish_slots, message.into()).await;
    }

    /// Creates a queue with the configured capacity, registers it, and
    /// returns a guard that deregisters it when dropped.
    pub fn subscribe(&self) -> Subscription {
        let (subscriber, inbox) = subscriber::channel(self.subscriber_capacity);
        self.register(subscriber);
        Subscription::new(inbox, self.clone())
    }

    /// A handle that can publish and do nothing else.
    pub fn publisher(&self) -> Publisher {
        Publisher {
            commands: self.commands.clone(),
            publish_slots: self.publish_slots.clone(),
        }
    }

    /// Current counters, answered in order with all other commands.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Stats(reply))
            .map_err(|_| HubError::Stopped)?;
        rx.await.map_err(|_| HubError::Stopped)
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Publish-only handle given to producers.
#[derive(Debug, Clone)]
pub struct Publisher {
    commands: mpsc::UnboundedSender<Command>,
    publish_slots: Arc<Semaphore>,
}

impl Publisher {
    /// Same as [`Hub::publish`].
    pub async fn publish(&self, message: impl Into<Message>) {
        enqueue_publish(&self.commands, &self.publish_slots, message.into()).await;
    }
}

async fn enqueue_publish(
    commands: &mpsc::UnboundedSender<Command>,
    publish_slots: &Arc<Semaphore>,
    message: Message,
) {
    match publish_slots.clone().acquire_owned().await {
        Ok(permit) => dispatch(commands, Command::Publish(message, permit)),
        Err(_) => warn!("Hub worker stopped; dropping publish command"),
    }
}

struct HubWorker {
    registry: HashMap<SubscriberHandle, Subscriber>,
    commands: mpsc::UnboundedReceiver<Command>,
    publish_slots: Arc<Semaphore>,
    delivery: DeliveryPolicy,
    cancel: CancellationToken,
    stats: HubStats,
}

impl HubWorker {
    async fn run(mut self) {
        debug!("Hub worker started with {:?} delivery", self.delivery);

        loop {
            let command = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            match command {
                Command::Register(subscriber) => self.register(subscriber),
                Command::Deregister(handle) => self.deregister(&handle),
                Command::Publish(message, _permit) => self.broadcast(message).await,
                Command::Stats(reply) => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        self.shutdown();
    }

    fn register(&mut self, subscriber: Subscriber) {
        if subscriber.is_disconnected() {
            debug!("Discarding registration of a subscriber whose inbox is gone");
            close(subscriber);
            return;
        }

        if self.registry.contains_key(subscriber.handle()) {
            warn!("Subscriber already registered; ignoring duplicate registration");
            return;
        }

        self.registry.insert(subscriber.handle().clone(), subscriber);
        info!("Subscriber added. {} registered subscribers", self.registry.len());
    }

    fn deregister(&mut self, handle: &SubscriberHandle) {
        match self.registry.remove(handle) {
            Some(subscriber) => {
                close(subscriber);
                info!(
                    "Subscriber removed. {} registered subscribers",
                    self.registry.len()
                );
            }
            None => {
                self.stats.ignored_deregistrations += 1;
                warn!("Ignoring deregistration of a subscriber that is not registered");
            }
        }
    }

    async fn broadcast(&mut self, message: Message) {
        self.stats.published += 1;

        if self.registry.is_empty() {
            trace!("No subscribers for message: {message}");
            return;
        }

        let mut delivered = 0;
        let mut failed = Vec::new();

        for (handle, subscriber) in &self.registry {
            match deliver(subscriber, message.clone(), self.delivery, &self.cancel).await {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Cancelled) => break,
                Err(e) => failed.push((handle.clone(), e)),
            }
        }

        self.stats.delivered += delivered;
        trace!("Delivered message to {delivered} subscribers");

        for (handle, reason) in failed {
            let Some(subscriber) = self.registry.remove(&handle) else {
                continue;
            };
            close(subscriber);

            match reason {
                DeliveryError::TimedOut(_) => {
                    self.stats.evicted += 1;
                    warn!(
                        "Evicted slow subscriber: {reason}. {} registered subscribers",
                        self.registry.len()
                    );
                }
                _ => debug!(
                    "Pruned subscriber: {reason}. {} registered subscribers",
                    self.registry.len()
                ),
            }
        }
    }

    fn snapshot(&self) -> HubStats {
        HubStats {
            subscribers: self.registry.len(),
            ..self.stats
        }
    }

    fn shutdown(&mut self) {
        self.commands.close();
        // Wakes publishers still waiting for a slot.
        self.publish_slots.close();

        let mut closed = 0;
        for (_, subscriber) in self.registry.drain() {
            close(subscriber);
            closed += 1;
        }

        // Registrations still queued never made it into the registry.
        while let Ok(command) = self.commands.try_recv() {
            if let Command::Register(subscriber) = command {
                close(subscriber);
            }
        }

        info!("Hub worker stopped; closed {closed} subscribers");
    }
}

fn close(subscriber: Subscriber) {
    if let Err(e) = subscriber.close() {
        error!("Failed to close subscriber: {e}");
    }
}

async fn deliver(
    subscriber: &Subscriber,
    message: Message,
    policy: DeliveryPolicy,
    cancel: &CancellationToken,
) -> Result<(), DeliveryError> {
    match policy {
        DeliveryPolicy::Block => tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DeliveryError::Cancelled),
            sent = subscriber.send(message) => sent,
        },
        DeliveryPolicy::Evict { timeout } => tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DeliveryError::Cancelled),
            sent = tokio::time::timeout(timeout, subscriber.send(message)) => {
                sent.unwrap_or(Err(DeliveryError::TimedOut(timeout)))
            }
        },
    }
}
