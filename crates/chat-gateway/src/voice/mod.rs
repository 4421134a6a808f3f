//! Voice handshake coordination
//!
//! Audio transport is not part of this crate; a [`VoiceConnector`] receives the
//! connection info once both halves of the handshake have arrived.

mod connector;
mod coordinator;

pub use connector::{VoiceConnectAttempt, VoiceConnectionInfo, VoiceConnector};
pub use coordinator::{FragmentOutcome, PendingConnectionCoordinator, VoiceFragment};

#[cfg(test)]
pub(crate) use coordinator::tests::RecordingConnector;
