//! Gateway session task
//!
//! One task owns the socket, the [`Session`] bookkeeping, the heartbeat ticker and the
//! outbound queue. Each socket lives inside [`GatewaySession::connect_and_run`]; losing
//! it hands control back to the reconnect loop, which decides between RESUME, a fresh
//! IDENTIFY and giving up.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chat_common::{ClientConfig, GatewayConfig, ReconnectConfig};
use chat_core::events::{ConnectionEvent, LostConnectionEvent, ReadyEvent};
use chat_core::DomainEvent;
use chat_rest::{get_gateway_url, RestGateway};
use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::{
    invalid_session_delay, DisconnectCause, FrameLimiter, GatewayCommand, GatewayHandle,
    Handshake, HeartbeatAction, HeartbeatTicker, ReconnectBackoff, Recovery, Session,
    SessionState,
};
use crate::error::{GatewayError, GatewayResult};
use crate::handlers::PacketDispatcher;
use crate::protocol::{GatewayMessage, IdentifyPayload, OpCode, ResumePayload};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Close code that keeps the session resumable
const CLOSE_RESUMABLE: u16 = 4000;
const CLOSE_NORMAL: u16 = 1000;
/// Close frame without a status code
const CLOSE_NO_STATUS: u16 = 1005;

/// How one socket ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    Shutdown,
    Lost(DisconnectCause),
}

/// Per-socket state
struct Socket {
    sink: WsSink,
    ticks: mpsc::UnboundedSender<()>,
    /// Kept alive for the socket's lifetime; dropping it stops the beats
    _heartbeat: Option<HeartbeatTicker>,
    identify_at: Option<Instant>,
}

/// A gateway session, not yet running
///
/// Build one with [`new`](Self::new), then [`spawn`](Self::spawn) it onto the runtime.
pub struct GatewaySession {
    token: String,
    gateway: GatewayConfig,
    reconnect: ReconnectConfig,
    session: Session,
    dispatcher: PacketDispatcher,
    rest: Option<Arc<dyn RestGateway>>,
    /// URL looked up over REST, reused for every fresh connect
    discovered_url: Option<String>,
    backoff: ReconnectBackoff,
    limiter: FrameLimiter,
    last_identify: Option<Instant>,
    /// Application frames waiting for READY or for frame budget
    deferred: VecDeque<GatewayMessage>,
    /// Set once a READY has been seen; later READYs are re-identifies
    was_ready: bool,
    /// Deadline for servers READY listed as unavailable
    loading_until: Option<Instant>,
    commands: mpsc::UnboundedReceiver<GatewayCommand>,
    command_tx: Option<mpsc::UnboundedSender<GatewayCommand>>,
    state_tx: watch::Sender<SessionState>,
    loaded_tx: watch::Sender<bool>,
}

impl GatewaySession {
    pub fn new(config: &ClientConfig, dispatcher: PacketDispatcher) -> Self {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        let (loaded_tx, _) = watch::channel(false);

        Self {
            token: config.token.clone(),
            gateway: config.gateway.clone(),
            reconnect: config.reconnect.clone(),
            session: Session::new(),
            dispatcher,
            rest: None,
            discovered_url: None,
            backoff: ReconnectBackoff::from_config(&config.reconnect),
            limiter: FrameLimiter::from_config(&config.gateway),
            last_identify: None,
            deferred: VecDeque::new(),
            was_ready: false,
            loading_until: None,
            commands,
            command_tx: Some(command_tx),
            state_tx,
            loaded_tx,
        }
    }

    /// Look the gateway URL up over REST when none is configured
    #[must_use]
    pub fn with_rest(mut self, rest: Arc<dyn RestGateway>) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Start the session task
    pub fn spawn(mut self) -> GatewayHandle {
        let state = self.state_tx.subscribe();
        let loaded = self.loaded_tx.subscribe();
        let commands = match self.command_tx.take() {
            Some(tx) => tx,
            // `new` always sets it and `spawn` consumes self
            None => mpsc::unbounded_channel().0,
        };
        let task = tokio::spawn(self.run());
        GatewayHandle::new(state, loaded, commands, task)
    }

    async fn run(mut self) -> GatewayResult<()> {
        let result = self.run_loop().await;

        self.session.on_shutdown();
        self.dispatcher.voice().abandon_all();
        self.sync_state();

        match &result {
            Ok(()) => tracing::info!("Gateway session closed"),
            Err(e) => tracing::error!(code = e.code(), error = %e, "Gateway session ended"),
        }
        result
    }

    async fn run_loop(&mut self) -> GatewayResult<()> {
        loop {
            let cause = match self.connect_and_run().await {
                Ok(ConnectionEnd::Shutdown) => return Ok(()),
                Ok(ConnectionEnd::Lost(cause)) => cause,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(code = e.code(), error = %e, "Gateway connection failed");
                    DisconnectCause::Transport
                }
            };

            let was_ready = self.session.state() == SessionState::Ready;
            let recovery = self.session.on_connection_lost(cause);
            self.sync_state();
            tracing::info!(?cause, ?recovery, "Gateway connection lost");

            if let Recovery::Fatal(code) = recovery {
                return Err(GatewayError::from_close_code(code));
            }
            if was_ready {
                self.dispatcher
                    .publish(DomainEvent::LostConnection(LostConnectionEvent {
                        resumable: recovery == Recovery::Resume,
                        timestamp: Utc::now(),
                    }));
            }

            let Some(delay) = self.backoff.next_delay() else {
                return Err(GatewayError::ReconnectExhausted {
                    attempts: self.backoff.attempts(),
                });
            };
            tracing::debug!(
                attempt = self.backoff.attempts(),
                delay_ms = delay.as_millis() as u64,
                "Waiting before reconnect"
            );
            if self.sleep_or_disconnect(delay).await {
                return Ok(());
            }
        }
    }

    /// Sleep, still queueing commands; `true` if asked to stop meanwhile
    async fn sleep_or_disconnect(&mut self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => return false,
                command = self.commands.recv() => match command {
                    Some(GatewayCommand::Send(message)) => self.deferred.push_back(message),
                    Some(GatewayCommand::Disconnect) | None => return true,
                },
            }
        }
    }

    async fn resolve_url(&mut self) -> GatewayResult<String> {
        if self.session.can_resume() {
            if let Some(url) = self.session.resume_url() {
                return Ok(self.gateway.connect_url(url));
            }
        }
        if let Some(url) = self.gateway.url.as_deref().or(self.discovered_url.as_deref()) {
            return Ok(self.gateway.connect_url(url));
        }

        let rest = self.rest.clone().ok_or(GatewayError::NoGatewayUrl)?;
        let url = get_gateway_url(rest.as_ref()).await?;
        tracing::debug!(url = %url, "Gateway URL discovered");
        let connect = self.gateway.connect_url(&url);
        self.discovered_url = Some(url);
        Ok(connect)
    }

    async fn connect_and_run(&mut self) -> GatewayResult<ConnectionEnd> {
        let url = self.resolve_url().await?;
        self.session.begin_connect();
        self.sync_state();
        tracing::info!(url = %url, state = %self.session.state(), "Connecting to gateway");

        let (stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (sink, mut stream) = stream.split();
        let (ticks, mut tick_rx) = mpsc::unbounded_channel();
        let mut socket = Socket {
            sink,
            ticks,
            _heartbeat: None,
            identify_at: None,
        };

        loop {
            let flush_at = self.flush_deferred(&mut socket).await?;
            let identify_at = socket.identify_at;
            let loading_until = self.loading_until;

            // Heartbeats and inbound frames go before commands so a busy application
            // cannot starve the connection
            tokio::select! {
                biased;

                Some(()) = tick_rx.recv() => match self.session.on_heartbeat_due() {
                    HeartbeatAction::Send(seq) => {
                        self.send_frame(&mut socket, &GatewayMessage::heartbeat(seq)).await?;
                    }
                    HeartbeatAction::Zombied => {
                        tracing::warn!("Heartbeat not acknowledged, dropping zombied connection");
                        close(&mut socket.sink, CLOSE_RESUMABLE, "zombied").await;
                        return Ok(ConnectionEnd::Lost(DisconnectCause::Zombied));
                    }
                },

                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(end) = self.on_text(&mut socket, &text).await? {
                            return Ok(end);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.map_or(CLOSE_NO_STATUS, |f| u16::from(f.code));
                        tracing::info!(code, "Gateway closed the connection");
                        return Ok(ConnectionEnd::Lost(DisconnectCause::Closed(code)));
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!("Ignoring binary frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket read failed");
                        return Ok(ConnectionEnd::Lost(DisconnectCause::Transport));
                    }
                    None => {
                        tracing::warn!("WebSocket stream ended without a close frame");
                        return Ok(ConnectionEnd::Lost(DisconnectCause::Transport));
                    }
                },

                command = self.commands.recv() => match command {
                    Some(GatewayCommand::Send(message)) => self.deferred.push_back(message),
                    Some(GatewayCommand::Disconnect) | None => {
                        close(&mut socket.sink, CLOSE_NORMAL, "disconnect").await;
                        return Ok(ConnectionEnd::Shutdown);
                    }
                },

                () = tokio::time::sleep_until(identify_at.unwrap_or_else(Instant::now)),
                    if identify_at.is_some() =>
                {
                    socket.identify_at = None;
                    self.send_identify(&mut socket).await?;
                },

                () = tokio::time::sleep_until(flush_at.unwrap_or_else(Instant::now)),
                    if flush_at.is_some() => {}

                () = tokio::time::sleep_until(loading_until.unwrap_or_else(Instant::now)),
                    if loading_until.is_some() => self.give_up_server_load(),
            }
        }
    }

    async fn on_text(
        &mut self,
        socket: &mut Socket,
        text: &str,
    ) -> GatewayResult<Option<ConnectionEnd>> {
        let message = match GatewayMessage::from_json(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable gateway frame");
                return Ok(None);
            }
        };
        if let Some(seq) = message.s {
            self.session.observe_sequence(seq);
        }

        match message.op {
            OpCode::Hello => self.on_hello(socket, &message).await?,
            OpCode::HeartbeatAck => self.session.on_heartbeat_ack(),
            OpCode::Heartbeat => {
                let seq = self.session.sequence();
                self.send_frame(socket, &GatewayMessage::heartbeat(seq)).await?;
            }
            OpCode::Reconnect => {
                tracing::info!("Gateway requested a reconnect");
                close(&mut socket.sink, CLOSE_RESUMABLE, "reconnect").await;
                return Ok(Some(ConnectionEnd::Lost(DisconnectCause::ReconnectRequested)));
            }
            OpCode::InvalidSession => {
                let resumable = message.d.as_bool().unwrap_or(false);
                self.session.on_invalid_session();
                self.dispatcher.voice().abandon_all();
                self.sync_state();

                let delay = invalid_session_delay(&self.reconnect);
                tracing::warn!(
                    resumable,
                    delay_ms = delay.as_millis() as u64,
                    "Session invalidated, identifying again"
                );
                socket.identify_at = Some((Instant::now() + delay).max(self.identify_deadline()));
            }
            OpCode::Dispatch => return Ok(self.on_dispatch(socket, message).await),
            other => tracing::debug!(op = ?other, "Ignoring unexpected opcode"),
        }
        Ok(None)
    }

    async fn on_hello(
        &mut self,
        socket: &mut Socket,
        message: &GatewayMessage,
    ) -> GatewayResult<()> {
        let Some(hello) = message.as_hello() else {
            tracing::warn!("HELLO without a heartbeat interval");
            return Ok(());
        };
        let interval = Duration::from_millis(hello.heartbeat_interval);
        let jitter: f64 = rand::thread_rng().gen();

        socket._heartbeat = Some(HeartbeatTicker::spawn(interval, jitter, socket.ticks.clone()));
        self.limiter.set_heartbeat_interval(interval);

        match self.session.on_hello(interval) {
            Handshake::Identify => {
                self.dispatcher.voice().abandon_all();
                socket.identify_at = Some(self.identify_deadline());
            }
            Handshake::Resume { session_id, seq } => {
                tracing::info!(session_id = %session_id, seq, "Resuming session");
                let resume = GatewayMessage::resume(&ResumePayload {
                    token: self.token.clone(),
                    session_id,
                    seq,
                })?;
                self.send_frame(socket, &resume).await?;
            }
        }
        self.sync_state();
        Ok(())
    }

    async fn on_dispatch(
        &mut self,
        socket: &mut Socket,
        message: GatewayMessage,
    ) -> Option<ConnectionEnd> {
        let Some(event_name) = message.t.as_deref() else {
            tracing::warn!("Dispatch without an event name");
            return None;
        };

        match event_name {
            "READY" => match self.dispatcher.populate(&message.d) {
                Ok(ready) => {
                    tracing::info!(
                        session_id = %ready.session_id,
                        user_id = %ready.user_id,
                        servers = ready.server_count,
                        "Session ready"
                    );
                    self.session
                        .on_ready(ready.session_id.clone(), ready.resume_url.clone());
                    self.backoff.reset();
                    self.begin_server_load();
                    self.sync_state();

                    let reconnect = std::mem::replace(&mut self.was_ready, true);
                    self.dispatcher.publish(DomainEvent::Ready(ReadyEvent {
                        session_id: ready.session_id,
                        user_id: ready.user_id,
                        server_count: ready.server_count,
                        reconnect,
                        timestamp: Utc::now(),
                    }));
                }
                Err(e) => {
                    tracing::error!(code = e.code(), error = %e, "Unusable READY payload");
                    close(&mut socket.sink, CLOSE_RESUMABLE, "bad ready").await;
                    return Some(ConnectionEnd::Lost(DisconnectCause::Transport));
                }
            },
            "RESUMED" => {
                tracing::info!(seq = ?self.session.sequence(), "Session resumed");
                self.session.on_resumed();
                self.backoff.reset();
                self.sync_state();
                self.dispatcher.publish(DomainEvent::Resumed(ConnectionEvent {
                    timestamp: Utc::now(),
                }));
            }
            name => {
                self.dispatcher.dispatch(name, &message.d);
                if self.loading_until.is_some() {
                    self.check_server_load();
                }
            }
        }
        None
    }

    /// Send queued application frames the budget allows; returns when to try again
    async fn flush_deferred(&mut self, socket: &mut Socket) -> GatewayResult<Option<Instant>> {
        if self.session.state() != SessionState::Ready {
            return Ok(None);
        }
        while !self.deferred.is_empty() {
            if let Some(wait) = self.limiter.try_command() {
                tracing::trace!(
                    queued = self.deferred.len(),
                    wait_ms = wait.as_millis() as u64,
                    "Frame budget spent, deferring commands"
                );
                return Ok(Some(Instant::now() + wait));
            }
            if let Some(message) = self.deferred.pop_front() {
                self.send_frame(socket, &message).await?;
            }
        }
        Ok(None)
    }

    async fn send_identify(&mut self, socket: &mut Socket) -> GatewayResult<()> {
        tracing::info!(intents = self.gateway.intents.bits(), "Identifying");
        let identify =
            GatewayMessage::identify(&IdentifyPayload::new(self.token.clone(), &self.gateway))?;
        self.send_frame(socket, &identify).await?;
        self.last_identify = Some(Instant::now());
        Ok(())
    }

    /// Earliest time the next IDENTIFY may go out
    fn identify_deadline(&self) -> Instant {
        let now = Instant::now();
        self.last_identify
            .map_or(now, |last| (last + self.reconnect.identify_interval).max(now))
    }

    async fn send_frame(
        &mut self,
        socket: &mut Socket,
        message: &GatewayMessage,
    ) -> GatewayResult<()> {
        let json = message.to_json()?;
        tracing::trace!(op = ?message.op, "Sending frame");
        socket.sink.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Start waiting for the servers READY listed as unavailable
    fn begin_server_load(&mut self) {
        let pending = self.dispatcher.cache().unavailable_servers().len();
        if pending == 0 {
            self.loading_until = None;
            self.set_servers_loaded(true);
            return;
        }
        tracing::debug!(pending, "Waiting for unavailable servers");
        self.loading_until = Some(Instant::now() + self.gateway.server_load_timeout);
        self.set_servers_loaded(false);
    }

    fn check_server_load(&mut self) {
        if self.dispatcher.cache().unavailable_servers().is_empty() {
            tracing::info!("All servers loaded");
            self.loading_until = None;
            self.set_servers_loaded(true);
        }
    }

    fn give_up_server_load(&mut self) {
        tracing::warn!(
            missing = self.dispatcher.cache().unavailable_servers().len(),
            "Servers still unavailable after load timeout"
        );
        self.loading_until = None;
        self.set_servers_loaded(true);
    }

    fn set_servers_loaded(&self, loaded: bool) {
        self.loaded_tx.send_if_modified(|current| {
            let changed = *current != loaded;
            *current = loaded;
            changed
        });
    }

    fn sync_state(&self) {
        self.state_tx.send_if_modified(|current| {
            let next = self.session.state();
            if *current == next {
                return false;
            }
            tracing::debug!(from = %current, to = %next, "Session state changed");
            *current = next;
            true
        });
    }
}

async fn close(sink: &mut WsSink, code: u16, reason: &str) {
    let frame = CloseFrame {
        code: WsCloseCode::from(code),
        reason: reason.to_owned().into(),
    };
    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %e, "Close frame not delivered");
    }
}
