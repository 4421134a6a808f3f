//! Integration test utilities for the gateway client
//!
//! A scripted mock gateway to point a real [`GatewaySession`](chat_gateway::GatewaySession)
//! at, plus payload builders for the dispatches the scenarios need.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
