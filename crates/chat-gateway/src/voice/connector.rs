//! Outbound seam for voice connection attempts

use chat_core::Snowflake;
use tokio::sync::mpsc;

/// Everything needed to open a voice connection for one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConnectionInfo {
    /// From the current user's VOICE_STATE_UPDATE
    pub session_id: String,
    /// From VOICE_SERVER_UPDATE
    pub token: String,
    pub endpoint: String,
}

/// Starts (or restarts) a voice connection
///
/// Called outside any coordinator lock. Must not block.
pub trait VoiceConnector: Send + Sync {
    fn try_connect(&self, server_id: Snowflake, info: VoiceConnectionInfo);
}

/// A connection attempt handed to a channel consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConnectAttempt {
    pub server_id: Snowflake,
    pub info: VoiceConnectionInfo,
}

impl VoiceConnector for mpsc::UnboundedSender<VoiceConnectAttempt> {
    fn try_connect(&self, server_id: Snowflake, info: VoiceConnectionInfo) {
        if self.send(VoiceConnectAttempt { server_id, info }).is_err() {
            tracing::debug!(server_id = %server_id, "Voice connect attempt dropped, no receiver");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_connector_forwards_attempts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let info = VoiceConnectionInfo {
            session_id: "s".to_string(),
            token: "t".to_string(),
            endpoint: "voice.example:443".to_string(),
        };

        tx.try_connect(Snowflake::new(1), info.clone());

        let attempt = rx.recv().await.unwrap();
        assert_eq!(attempt.server_id, Snowflake::new(1));
        assert_eq!(attempt.info, info);
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel::<VoiceConnectAttempt>();
        drop(rx);
        tx.try_connect(
            Snowflake::new(1),
            VoiceConnectionInfo {
                session_id: "s".to_string(),
                token: "t".to_string(),
                endpoint: "e".to_string(),
            },
        );
    }
}
