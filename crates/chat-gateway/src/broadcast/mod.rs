//! Event broadcasting
//!
//! Distributes domain events from the packet dispatcher to application listeners.

mod event_bus;

pub use event_bus::{EventBus, PublishedEvent};
