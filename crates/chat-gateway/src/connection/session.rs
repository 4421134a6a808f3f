//! Session state machine
//!
//! Pure bookkeeping of one logical gateway session across any number of sockets: which
//! handshake to send, whether a heartbeat went unanswered, and how to recover when a
//! socket is lost. No I/O happens here; the runner acts on what these methods return.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::CloseCode;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No socket, or stopped for good
    Disconnected,
    /// Socket opening, waiting for HELLO
    Connecting,
    /// IDENTIFY scheduled or sent, waiting for READY
    Identifying,
    /// Events are flowing
    Ready,
    /// Reconnecting to continue the old session, waiting for RESUMED
    Resuming,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Identifying => "identifying",
            Self::Ready => "ready",
            Self::Resuming => "resuming",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Handshake to send after HELLO
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    Identify,
    Resume { session_id: String, seq: u64 },
}

/// What to do when the heartbeat timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Send a heartbeat carrying this sequence
    Send(Option<u64>),
    /// The previous heartbeat was never acknowledged
    Zombied,
}

/// Why a socket went away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectCause {
    /// Close frame with this code
    Closed(u16),
    /// Read or write failure, or the stream ended without a close frame
    Transport,
    /// Heartbeat went unacknowledged
    Zombied,
    /// Server sent RECONNECT
    ReconnectRequested,
}

/// How to continue after a lost socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Resume,
    Identify,
    /// Stop; reconnecting cannot succeed
    Fatal(CloseCode),
}

/// Gateway session bookkeeping
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    session_id: Option<String>,
    /// Highest dispatch sequence seen in this session
    sequence: Option<u64>,
    resume_url: Option<String>,
    heartbeat_interval: Option<Duration>,
    last_heartbeat_acked: bool,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            session_id: None,
            sequence: None,
            resume_url: None,
            heartbeat_interval: None,
            last_heartbeat_acked: true,
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[inline]
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    /// A session id and a sequence are both known
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    /// A socket is being opened
    pub fn begin_connect(&mut self) {
        if self.state != SessionState::Resuming {
            self.state = SessionState::Connecting;
        }
    }

    /// HELLO arrived; decide between RESUME and IDENTIFY
    pub fn on_hello(&mut self, heartbeat_interval: Duration) -> Handshake {
        self.heartbeat_interval = Some(heartbeat_interval);
        // The first beat goes out as if the previous one was acknowledged
        self.last_heartbeat_acked = true;

        if self.state == SessionState::Resuming {
            if let (Some(session_id), Some(seq)) = (&self.session_id, self.sequence) {
                return Handshake::Resume {
                    session_id: session_id.clone(),
                    seq,
                };
            }
        }

        self.start_fresh();
        Handshake::Identify
    }

    /// Record a dispatch sequence number
    pub fn observe_sequence(&mut self, seq: u64) {
        self.sequence = Some(self.sequence.map_or(seq, |current| current.max(seq)));
    }

    /// READY arrived
    pub fn on_ready(&mut self, session_id: String, resume_url: Option<String>) {
        self.session_id = Some(session_id);
        self.resume_url = resume_url;
        self.state = SessionState::Ready;
    }

    /// RESUMED arrived
    pub fn on_resumed(&mut self) {
        self.state = SessionState::Ready;
    }

    /// INVALID_SESSION arrived; the next handshake on this socket is a fresh IDENTIFY
    pub fn on_invalid_session(&mut self) {
        self.start_fresh();
    }

    /// The heartbeat timer fired
    pub fn on_heartbeat_due(&mut self) -> HeartbeatAction {
        if !self.last_heartbeat_acked {
            return HeartbeatAction::Zombied;
        }
        self.last_heartbeat_acked = false;
        HeartbeatAction::Send(self.sequence)
    }

    pub fn on_heartbeat_ack(&mut self) {
        self.last_heartbeat_acked = true;
    }

    /// The socket is gone; decide how to come back
    pub fn on_connection_lost(&mut self, cause: DisconnectCause) -> Recovery {
        self.heartbeat_interval = None;
        self.last_heartbeat_acked = true;

        if let DisconnectCause::Closed(raw) = cause {
            if let Some(code) = CloseCode::from_u16(raw) {
                if code.is_fatal() {
                    self.clear();
                    self.state = SessionState::Disconnected;
                    return Recovery::Fatal(code);
                }
                if code.requires_new_session() {
                    self.clear();
                }
            }
        }

        if self.can_resume() {
            self.state = SessionState::Resuming;
            Recovery::Resume
        } else {
            self.clear();
            self.state = SessionState::Disconnected;
            Recovery::Identify
        }
    }

    /// The operator closed the session
    pub fn on_shutdown(&mut self) {
        self.heartbeat_interval = None;
        self.state = SessionState::Disconnected;
    }

    fn start_fresh(&mut self) {
        self.clear();
        self.state = SessionState::Identifying;
    }

    fn clear(&mut self) {
        self.session_id = None;
        self.sequence = None;
        self.resume_url = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
