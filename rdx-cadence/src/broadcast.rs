//! Fan-out of engine events to independent subscribers.
//!
//! Every subscriber owns a small bounded queue. Broadcasting never waits: when
//! a subscriber's queue is full the event is dropped for that subscriber only,
//! so a stalled consumer can never hold up the timer.

use crate::common::SubscriberId;
use crate::events::Event;
use parking_lot::Mutex;
use slotmap::SlotMap;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, trace};

/// Queue depth of each subscriber.
pub const SUBSCRIBER_CAPACITY: usize = 16;

/// A read-only stream of engine events.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Event>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next event. Returns `None` once the subscription has been
    /// removed and its queue drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Result<Event, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// The registry of subscriber queues.
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: Mutex<SlotMap<SubscriberId, mpsc::Sender<Event>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber with the default queue depth.
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_capacity(SUBSCRIBER_CAPACITY)
    }

    /// Registers a new subscriber whose queue holds `capacity` events.
    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscription {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let id = self.subscribers.lock().insert(sender);
        debug!(?id, capacity, "Subscriber added.");
        Subscription { id, receiver }
    }

    /// Removes a subscriber. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.lock().remove(id).is_some();
        if removed {
            debug!(?id, "Subscriber removed.");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Offers `event` to every subscriber without blocking.
    ///
    /// Full queues drop the event. Subscribers whose receiving side is gone
    /// are pruned.
    pub fn broadcast(&self, event: &Event) {
        let mut subscribers = self.subscribers.lock();
        let mut closed = Vec::new();
        for (id, sender) in subscribers.iter() {
            match sender.try_send(*event) {
                Ok(()) => trace!(?id, ?event, "Event delivered."),
                Err(TrySendError::Full(dropped)) => {
                    debug!(?id, event = ?dropped, "Subscriber is full, dropped event.");
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }
        for id in closed {
            subscribers.remove(id);
            debug!(?id, "Subscriber went away, removed.");
        }
    }
}
