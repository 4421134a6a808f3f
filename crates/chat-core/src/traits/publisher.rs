//! Event sink consumed by everything that mutates the cache

use crate::events::DomainEvent;

/// Fire-and-forget sink for typed domain events.
///
/// Implementations must not block: publishing happens inside packet dispatch, after the
/// cache has already been mutated, and the caller never observes a result.
pub trait EventPublisher: Send + Sync {
    /// Publish an event under its bus tag
    fn publish(&self, tag: &'static str, event: DomainEvent);

    /// Publish an event under its own [`DomainEvent::event_type`] tag
    fn emit(&self, event: DomainEvent) {
        self.publish(event.event_type(), event);
    }
}
