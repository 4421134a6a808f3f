//! Application-scoped event bus
//!
//! Fans published domain events out to any number of subscribers over a
//! `tokio::sync::broadcast` channel. Publishing never blocks; a subscriber that falls
//! more than `capacity` events behind loses the oldest ones.

use chat_core::{DomainEvent, EventPublisher};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// An event together with the tag it was published under
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub tag: &'static str,
    pub event: DomainEvent,
}

/// Broadcast bus implementing [`EventPublisher`]
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Run `listener` for each event on a worker task
    ///
    /// The task ends when every bus handle has been dropped.
    pub fn spawn_listener<F>(&self, mut listener: F) -> JoinHandle<()>
    where
        F: FnMut(PublishedEvent) + Send + 'static,
    {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => listener(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event listener lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Event listener stopped");
        })
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, tag: &'static str, event: DomainEvent) {
        if self.sender.send(PublishedEvent { tag, event }).is_err() {
            tracing::trace!(tag, "No subscribers for event");
        }
    }
}
