//! Events published by the client after the cache changed

mod domain_event;

pub use domain_event::*;
