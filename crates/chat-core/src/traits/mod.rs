//! Seams implemented outside the domain layer

mod publisher;

pub use publisher::EventPublisher;
