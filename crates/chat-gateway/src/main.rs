//! Gateway client entry point
//!
//! Run with:
//! ```bash
//! CHAT_TOKEN=... cargo run -p chat-gateway
//! ```
//!
//! Configuration is loaded from environment variables. Every published event is logged;
//! Ctrl-C closes the session.

use std::sync::Arc;

use chat_cache::EntityCache;
use chat_common::{try_init_tracing, ClientConfig};
use chat_gateway::{
    EventBus, GatewayHandle, GatewaySession, PacketDispatcher, PendingConnectionCoordinator,
    VoiceConnectAttempt,
};
use chat_rest::HttpRestGateway;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Gateway client stopped with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    info!(
        env = ?config.env,
        api_version = config.gateway.api_version,
        intents = config.gateway.intents.bits(),
        "Configuration loaded"
    );

    let cache = EntityCache::new_shared();
    let bus = Arc::new(EventBus::new(config.gateway.event_buffer));

    let (voice_tx, mut voice_rx) = mpsc::unbounded_channel::<VoiceConnectAttempt>();
    let voice = Arc::new(PendingConnectionCoordinator::new(Arc::new(voice_tx)));

    // No audio transport here: accept every attempt as the live connection
    let registry = Arc::clone(&voice);
    tokio::spawn(async move {
        while let Some(attempt) = voice_rx.recv().await {
            info!(
                server_id = %attempt.server_id,
                endpoint = %attempt.info.endpoint,
                "Voice connection info complete"
            );
            registry.register_active(attempt.server_id, attempt.info);
        }
    });

    let listener = bus.spawn_listener(|published| {
        info!(tag = published.tag, event = ?published.event, "Event");
    });

    let rest = Arc::new(HttpRestGateway::from_config(&config.token, &config.rest)?);
    let dispatcher = PacketDispatcher::new(cache, bus.clone(), voice);
    let gateway = GatewaySession::new(&config, dispatcher).with_rest(rest).spawn();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down");
            gateway.disconnect()?;
        }
        () = wait_finished(&gateway) => {}
    }

    let result = gateway.join().await;
    // The listener drains once the last bus handle is gone
    drop(bus);
    if let Err(e) = listener.await {
        error!(error = %e, "Event listener failed");
    }
    result?;
    Ok(())
}

/// Resolves once the session task stops on its own
async fn wait_finished(gateway: &GatewayHandle) {
    let mut state = gateway.watch_state();
    while state.changed().await.is_ok() {}
}
