//! # chat-gateway
//!
//! Client side of the real-time gateway: keeps one session alive across reconnects,
//! applies dispatch packets to the entity cache, publishes domain events and pairs the
//! two halves of the voice handshake.
//!
//! ## Example
//!
//! ```ignore
//! use chat_gateway::{EventBus, GatewaySession, PacketDispatcher, PendingConnectionCoordinator};
//!
//! let bus = Arc::new(EventBus::new(config.gateway.event_buffer));
//! let voice = Arc::new(PendingConnectionCoordinator::new(connector));
//! let dispatcher = PacketDispatcher::new(cache.clone(), bus.clone(), voice);
//!
//! let gateway = GatewaySession::new(&config, dispatcher).with_rest(rest).spawn();
//! gateway.wait_until_ready().await?;
//! ```

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod voice;

pub use broadcast::{EventBus, PublishedEvent};
pub use connection::{GatewayCommand, GatewayHandle, GatewaySession, SessionState};
pub use error::{GatewayError, GatewayResult};
pub use handlers::{HandlerError, PacketDispatcher, ReadyInfo};
pub use voice::{
    FragmentOutcome, PendingConnectionCoordinator, VoiceConnectAttempt, VoiceConnectionInfo,
    VoiceConnector, VoiceFragment,
};
