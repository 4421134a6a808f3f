//! Handle to a running gateway session

use chat_core::Snowflake;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::SessionState;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{
    GatewayMessage, PresenceUpdatePayload, RequestGuildMembersPayload, VoiceStateUpdatePayload,
};

/// Instruction for the session task
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCommand {
    /// Queue an application frame; sent once the session is ready and the frame budget allows
    Send(GatewayMessage),
    /// Close the socket and stop for good
    Disconnect,
}

/// Owner's side of a spawned [`GatewaySession`](super::GatewaySession)
///
/// Dropping the handle stops the session as if [`disconnect`](Self::disconnect) had been
/// called.
#[derive(Debug)]
pub struct GatewayHandle {
    state: watch::Receiver<SessionState>,
    servers_loaded: watch::Receiver<bool>,
    commands: mpsc::UnboundedSender<GatewayCommand>,
    task: JoinHandle<GatewayResult<()>>,
}

impl GatewayHandle {
    pub(super) fn new(
        state: watch::Receiver<SessionState>,
        servers_loaded: watch::Receiver<bool>,
        commands: mpsc::UnboundedSender<GatewayCommand>,
        task: JoinHandle<GatewayResult<()>>,
    ) -> Self {
        Self {
            state,
            servers_loaded,
            commands,
            task,
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the session is (again) ready
    ///
    /// Fails with [`GatewayError::Closed`] once the session task has stopped.
    pub async fn wait_until_ready(&self) -> GatewayResult<()> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| *s == SessionState::Ready)
            .await
            .map(|_| ())
            .map_err(|_| GatewayError::Closed)
    }

    /// Whether every server of the last READY has arrived, or the wait timed out
    pub fn servers_loaded(&self) -> bool {
        *self.servers_loaded.borrow()
    }

    /// Wait until the servers the last READY announced as unavailable have arrived
    ///
    /// Gives up waiting after the configured server load timeout and resolves anyway.
    pub async fn wait_until_servers_loaded(&self) -> GatewayResult<()> {
        let mut loaded = self.servers_loaded.clone();
        loaded
            .wait_for(|loaded| *loaded)
            .await
            .map(|_| ())
            .map_err(|_| GatewayError::Closed)
    }

    pub fn update_presence(&self, presence: &PresenceUpdatePayload) -> GatewayResult<()> {
        self.send(GatewayMessage::presence_update(presence)?)
    }

    /// Join, move within, or leave (`channel_id: None`) voice in a server
    pub fn update_voice_state(
        &self,
        server_id: Snowflake,
        channel_id: Option<Snowflake>,
        self_mute: bool,
        self_deaf: bool,
    ) -> GatewayResult<()> {
        self.send(GatewayMessage::voice_state_update(&VoiceStateUpdatePayload {
            guild_id: server_id,
            channel_id,
            self_mute,
            self_deaf,
        })?)
    }

    pub fn request_guild_members(&self, request: &RequestGuildMembersPayload) -> GatewayResult<()> {
        self.send(GatewayMessage::request_guild_members(request)?)
    }

    /// Queue a raw frame
    pub fn send(&self, message: GatewayMessage) -> GatewayResult<()> {
        self.command(GatewayCommand::Send(message))
    }

    /// Ask the session to close; use [`join`](Self::join) to wait for it
    pub fn disconnect(&self) -> GatewayResult<()> {
        self.command(GatewayCommand::Disconnect)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session task and return how it ended
    pub async fn join(self) -> GatewayResult<()> {
        self.task
            .await
            .map_err(|e| GatewayError::Task(e.to_string()))?
    }

    fn command(&self, command: GatewayCommand) -> GatewayResult<()> {
        self.commands
            .send(command)
            .map_err(|_| GatewayError::Closed)
    }
}
