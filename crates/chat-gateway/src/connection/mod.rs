//! Gateway connection
//!
//! Session bookkeeping, reconnect policy, heartbeat and frame budgeting, and the task
//! that ties them to a WebSocket.

mod backoff;
mod handle;
mod heartbeat;
mod limiter;
mod runner;
mod session;

pub use backoff::{invalid_session_delay, ReconnectBackoff};
pub use handle::{GatewayCommand, GatewayHandle};
pub use heartbeat::{first_beat_delay, HeartbeatTicker};
pub use limiter::FrameLimiter;
pub use runner::GatewaySession;
pub use session::{DisconnectCause, Handshake, HeartbeatAction, Recovery, Session, SessionState};
