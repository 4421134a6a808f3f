//! Pending voice connection coordinator
//!
//! A voice connection needs the session id from the current user's VOICE_STATE_UPDATE
//! and the token and endpoint from VOICE_SERVER_UPDATE. The two arrive in either order.
//! Each server has at most one pending record; the fragment that completes it triggers
//! exactly one connect attempt.
//!
//! Precedence with an active connection: the pending record is checked first and, if
//! it completes, its attempt replaces the active connection. A token/endpoint fragment
//! that completes nothing while a connection is active is a rotation and re-triggers the
//! active connection with the new values.

use std::sync::Arc;

use chat_core::Snowflake;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{VoiceConnectionInfo, VoiceConnector};

/// One half of the voice handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceFragment {
    SessionId(String),
    TokenAndEndpoint { token: String, endpoint: String },
}

/// Result of applying a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutcome {
    /// Stored; the other half is still missing
    Waiting,
    /// The pending record completed and a connect attempt was issued
    Fired,
    /// The active connection got a new token/endpoint and was re-triggered
    Rotated,
}

#[derive(Debug, Default)]
struct PendingVoiceConnection {
    session_id: Option<String>,
    token: Option<String>,
    endpoint: Option<String>,
}

impl PendingVoiceConnection {
    fn apply(&mut self, fragment: VoiceFragment) {
        match fragment {
            VoiceFragment::SessionId(session_id) => self.session_id = Some(session_id),
            VoiceFragment::TokenAndEndpoint { token, endpoint } => {
                self.token = Some(token);
                self.endpoint = Some(endpoint);
            }
        }
    }

    /// Connection info once both halves are present
    fn completed(&self) -> Option<VoiceConnectionInfo> {
        match (&self.session_id, &self.token, &self.endpoint) {
            (Some(session_id), Some(token), Some(endpoint))
                if !session_id.is_empty() && !token.is_empty() && !endpoint.is_empty() =>
            {
                Some(VoiceConnectionInfo {
                    session_id: session_id.clone(),
                    token: token.clone(),
                    endpoint: endpoint.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Reconciles voice handshake fragments per server
pub struct PendingConnectionCoordinator {
    pending: DashMap<Snowflake, PendingVoiceConnection>,
    active: DashMap<Snowflake, VoiceConnectionInfo>,
    connector: Arc<dyn VoiceConnector>,
}

impl PendingConnectionCoordinator {
    pub fn new(connector: Arc<dyn VoiceConnector>) -> Self {
        Self {
            pending: DashMap::new(),
            active: DashMap::new(),
            connector,
        }
    }

    /// Apply a fragment for `server_id`
    pub fn on_session_fragment_received(
        &self,
        server_id: Snowflake,
        fragment: VoiceFragment,
    ) -> FragmentOutcome {
        let rotation = match &fragment {
            VoiceFragment::TokenAndEndpoint { token, endpoint } => {
                Some((token.clone(), endpoint.clone()))
            }
            VoiceFragment::SessionId(_) => None,
        };

        // A completed record leaves the map under the same entry lock that completed it;
        // the connector runs after the lock is released
        let completed = match self.pending.entry(server_id) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().apply(fragment);
                let info = entry.get().completed();
                if info.is_some() {
                    entry.remove();
                }
                info
            }
            Entry::Vacant(entry) => {
                let mut record = PendingVoiceConnection::default();
                record.apply(fragment);
                let info = record.completed();
                if info.is_none() {
                    entry.insert(record);
                }
                info
            }
        };

        if let Some(info) = completed {
            if let Some(mut active) = self.active.get_mut(&server_id) {
                *active = info.clone();
            }
            tracing::debug!(server_id = %server_id, endpoint = %info.endpoint, "Voice handshake complete");
            self.connector.try_connect(server_id, info);
            return FragmentOutcome::Fired;
        }

        if let Some((token, endpoint)) = rotation {
            let refreshed = self.active.get_mut(&server_id).map(|mut active| {
                active.token = token;
                active.endpoint = endpoint;
                active.clone()
            });
            if let Some(info) = refreshed {
                // The token went to the live connection; don't let it complete a later record
                self.pending
                    .remove_if(&server_id, |_, record| record.session_id.is_none());
                tracing::debug!(server_id = %server_id, endpoint = %info.endpoint, "Voice server rotated");
                self.connector.try_connect(server_id, info);
                return FragmentOutcome::Rotated;
            }
        }

        FragmentOutcome::Waiting
    }

    /// Record a connection that is up
    pub fn register_active(&self, server_id: Snowflake, info: VoiceConnectionInfo) {
        self.active.insert(server_id, info);
    }

    pub fn remove_active(&self, server_id: Snowflake) -> Option<VoiceConnectionInfo> {
        self.active.remove(&server_id).map(|(_, info)| info)
    }

    pub fn active(&self, server_id: Snowflake) -> Option<VoiceConnectionInfo> {
        self.active.get(&server_id).map(|r| r.value().clone())
    }

    pub fn has_pending(&self, server_id: Snowflake) -> bool {
        self.pending.contains_key(&server_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The current user left voice in `server_id`
    pub fn on_voice_disconnect(&self, server_id: Snowflake) {
        let had_pending = self.pending.remove(&server_id).is_some();
        let had_active = self.active.remove(&server_id).is_some();
        if had_pending || had_active {
            tracing::debug!(server_id = %server_id, had_pending, had_active, "Voice connection dropped");
        }
    }

    /// Forget every pending record; called when a new session replaces the old one
    pub fn abandon_all(&self) {
        let abandoned = self.pending.len();
        self.pending.clear();
        if abandoned > 0 {
            tracing::debug!(abandoned, "Abandoned pending voice connections");
        }
    }
}

impl std::fmt::Debug for PendingConnectionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingConnectionCoordinator")
            .field("pending", &self.pending.len())
            .field("active", &self.active.len())
            .finish()
    }
}
