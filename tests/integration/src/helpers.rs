//! Test helpers for integration tests
//!
//! [`MockGateway`] accepts WebSocket connections on a local port and hands each one to
//! the test as a [`MockConnection`] to script. [`TestClient`] wires a real gateway
//! session, cache and event bus against it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chat_cache::EntityCache;
use chat_common::{ClientConfig, ReconnectConfig};
use chat_gateway::protocol::{GatewayMessage, OpCode};
use chat_gateway::{
    EventBus, GatewayHandle, GatewaySession, PacketDispatcher, PendingConnectionCoordinator,
    PublishedEvent, VoiceConnectAttempt,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Upper bound for any single wait in a scenario
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Heartbeat interval announced in HELLO
pub const HEARTBEAT_INTERVAL_MS: u64 = 41_250;

pub const TEST_TOKEN: &str = "test-token";

/// Local gateway server
pub struct MockGateway {
    addr: SocketAddr,
    connections: mpsc::UnboundedReceiver<MockConnection>,
    _handle: JoinHandle<()>,
}

impl MockGateway {
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, connections) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => {
                        if tx.send(MockConnection { ws }).is_err() {
                            break;
                        }
                    }
                    Err(e) => eprintln!("mock gateway handshake failed: {e}"),
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Wait for the client to open its next socket
    pub async fn next_connection(&mut self) -> Result<MockConnection> {
        timeout(STEP_TIMEOUT, self.connections.recv())
            .await
            .context("no connection within timeout")?
            .context("mock gateway stopped")
    }

    /// Assert the client does not reconnect within `wait`
    pub async fn expect_no_connection(&mut self, wait: Duration) -> Result<()> {
        match timeout(wait, self.connections.recv()).await {
            Ok(Some(_)) => bail!("client opened an unexpected connection"),
            _ => Ok(()),
        }
    }
}

/// Server side of one client socket
pub struct MockConnection {
    ws: WebSocketStream<TcpStream>,
}

impl MockConnection {
    pub async fn send(&mut self, message: &GatewayMessage) -> Result<()> {
        self.ws.send(Message::Text(message.to_json()?)).await?;
        Ok(())
    }

    pub async fn hello(&mut self) -> Result<()> {
        self.hello_every(HEARTBEAT_INTERVAL_MS).await
    }

    /// HELLO with a custom heartbeat interval in milliseconds
    pub async fn hello_every(&mut self, interval_ms: u64) -> Result<()> {
        self.send(&GatewayMessage::hello(interval_ms)).await
    }

    pub async fn dispatch(&mut self, event: &str, seq: u64, data: serde_json::Value) -> Result<()> {
        self.send(&GatewayMessage::dispatch(event, seq, data)).await
    }

    /// Next non-heartbeat frame from the client; heartbeats are acknowledged on the way
    pub async fn recv(&mut self) -> Result<GatewayMessage> {
        loop {
            let message = self.recv_raw().await?;
            if message.op == OpCode::Heartbeat {
                self.send(&GatewayMessage::heartbeat_ack()).await?;
                continue;
            }
            return Ok(message);
        }
    }

    /// Next heartbeat from the client; returns the sequence it carried
    pub async fn recv_heartbeat(&mut self) -> Result<Option<u64>> {
        loop {
            let message = self.recv_raw().await?;
            if let Some(seq) = message.as_heartbeat_seq() {
                self.send(&GatewayMessage::heartbeat_ack()).await?;
                return Ok(seq);
            }
        }
    }

    /// Close code of the client's close frame, `None` if it closed without one
    pub async fn wait_closed(&mut self) -> Result<Option<u16>> {
        loop {
            let frame = timeout(STEP_TIMEOUT, self.ws.next())
                .await
                .context("client did not close within timeout")?;
            match frame {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Close with a gateway close code
    pub async fn close(mut self, code: u16, reason: &str) -> Result<()> {
        self.ws
            .close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: reason.to_owned().into(),
            }))
            .await?;
        // Drain until the client's reply
        while let Ok(Some(Ok(_))) = timeout(STEP_TIMEOUT, self.ws.next()).await {}
        Ok(())
    }

    /// Next frame from the client, heartbeats included and left unacknowledged
    pub async fn recv_raw(&mut self) -> Result<GatewayMessage> {
        loop {
            let frame = timeout(STEP_TIMEOUT, self.ws.next())
                .await
                .context("no frame within timeout")?
                .context("client closed the socket")??;
            match frame {
                Message::Text(text) => return Ok(GatewayMessage::from_json(&text)?),
                Message::Close(frame) => bail!("client closed the socket: {frame:?}"),
                _ => continue,
            }
        }
    }
}

/// Client configuration pointed at a mock gateway, with test-sized delays
pub fn test_config(url: &str) -> ClientConfig {
    let mut config = ClientConfig::new(TEST_TOKEN);
    config.gateway.url = Some(url.to_string());
    config.reconnect = ReconnectConfig {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        max_attempts: Some(5),
        invalid_session_delay_min: Duration::from_millis(10),
        invalid_session_delay_max: Duration::from_millis(20),
        identify_interval: Duration::ZERO,
    };
    config
}

/// A running gateway session and everything it feeds
pub struct TestClient {
    pub cache: Arc<EntityCache>,
    pub gateway: GatewayHandle,
    pub events: broadcast::Receiver<PublishedEvent>,
    pub voice_attempts: mpsc::UnboundedReceiver<VoiceConnectAttempt>,
    _bus: Arc<EventBus>,
}

impl TestClient {
    pub fn spawn(config: &ClientConfig) -> Self {
        let cache = EntityCache::new_shared();
        let bus = Arc::new(EventBus::new(256));
        let events = bus.subscribe();

        let (voice_tx, voice_attempts) = mpsc::unbounded_channel();
        let voice = Arc::new(PendingConnectionCoordinator::new(Arc::new(voice_tx)));
        let dispatcher = PacketDispatcher::new(cache.clone(), bus.clone(), voice);
        let gateway = GatewaySession::new(config, dispatcher).spawn();

        Self {
            cache,
            gateway,
            events,
            voice_attempts,
            _bus: bus,
        }
    }

    /// Skip events until one with `tag` arrives
    pub async fn expect_event(&mut self, tag: &str) -> Result<PublishedEvent> {
        loop {
            let event = timeout(STEP_TIMEOUT, self.events.recv())
                .await
                .with_context(|| format!("no {tag} event within timeout"))??;
            if event.tag == tag {
                return Ok(event);
            }
        }
    }

    pub async fn next_voice_attempt(&mut self) -> Result<VoiceConnectAttempt> {
        timeout(STEP_TIMEOUT, self.voice_attempts.recv())
            .await
            .context("no voice connect attempt within timeout")?
            .context("voice channel closed")
    }
}
