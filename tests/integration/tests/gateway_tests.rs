//! Gateway session scenarios against a scripted local gateway
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use anyhow::Result;
use chat_core::{DomainEvent, Snowflake};
use chat_gateway::protocol::{GatewayMessage, OpCode, PresenceUpdatePayload, Status};
use chat_gateway::{GatewayError, SessionState};
use integration_tests::*;
use tokio::time::timeout;

/// Open a socket, identify and become ready under `session_id`
async fn establish(
    mock: &mut MockGateway,
    client: &mut TestClient,
    session_id: &str,
) -> Result<MockConnection> {
    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    let identify = conn.recv().await?;
    assert_eq!(identify.op, OpCode::Identify);

    conn.dispatch("READY", 1, ready(session_id, &[server(1)])).await?;
    client.expect_event("READY").await?;
    Ok(conn)
}

#[tokio::test]
async fn test_identify_then_resume_after_drop() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    let identify = conn.recv().await?;
    assert_eq!(identify.op, OpCode::Identify);
    assert_eq!(identify.d["token"], TEST_TOKEN);
    assert!(identify.d.get("seq").is_none());

    conn.dispatch("READY", 1, ready("abc", &[server(1)])).await?;
    match client.expect_event("READY").await?.event {
        DomainEvent::Ready(e) => {
            assert_eq!(e.session_id, "abc");
            assert_eq!(e.user_id, Snowflake::new(ME));
            assert_eq!(e.server_count, 1);
            assert!(!e.reconnect);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    client.gateway.wait_until_ready().await?;
    client.gateway.wait_until_servers_loaded().await?;
    assert!(client.cache.servers().contains(&Snowflake::new(1)));
    assert_eq!(client.cache.current_user_id(), Some(Snowflake::new(ME)));

    // Network drop without a close frame
    drop(conn);
    match client.expect_event("LOST_CONNECTION").await?.event {
        DomainEvent::LostConnection(e) => assert!(e.resumable),
        other => panic!("unexpected event: {other:?}"),
    }

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    let resume = conn.recv().await?;
    assert_eq!(resume.op, OpCode::Resume);
    assert_eq!(resume.d["session_id"], "abc");
    assert_eq!(resume.d["seq"], 1);
    assert_eq!(resume.d["token"], TEST_TOKEN);

    // Missed events are replayed before RESUMED
    conn.dispatch("MESSAGE_CREATE", 2, message_create(100, 10, "one")).await?;
    conn.dispatch("MESSAGE_CREATE", 3, message_create(101, 10, "two")).await?;
    conn.dispatch("RESUMED", 4, serde_json::json!({})).await?;

    client.expect_event("MESSAGE_CREATED").await?;
    client.expect_event("MESSAGE_CREATED").await?;
    client.expect_event("RESUMED").await?;
    assert_eq!(client.gateway.state(), SessionState::Ready);

    // Cache survived the resume untouched
    assert!(client.cache.servers().contains(&Snowflake::new(1)));
    assert_eq!(client.cache.channels_of(Snowflake::new(1)).len(), 2);
    assert_eq!(client.cache.messages().len(), 2);

    // Server-requested heartbeat reports the latest sequence
    conn.send(&GatewayMessage::heartbeat(None)).await?;
    let mut seq = conn.recv_heartbeat().await?;
    while seq != Some(4) {
        seq = conn.recv_heartbeat().await?;
    }

    client.gateway.disconnect()?;
    assert_eq!(conn.wait_closed().await?, Some(1000));
    client.gateway.join().await?;
    Ok(())
}

#[tokio::test]
async fn test_authentication_failure_is_terminal() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let client = TestClient::spawn(&test_config(&mock.url()));

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    assert_eq!(conn.recv().await?.op, OpCode::Identify);
    conn.close(4004, "Authentication failed").await?;

    let result = tokio::time::timeout(STEP_TIMEOUT, client.gateway.join()).await?;
    assert!(matches!(result, Err(GatewayError::AuthenticationFailed)));
    mock.expect_no_connection(Duration::from_millis(200)).await?;
    Ok(())
}

#[tokio::test]
async fn test_invalid_session_falls_back_to_identify() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));

    let conn = establish(&mut mock, &mut client, "abc").await?;
    drop(conn);

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    assert_eq!(conn.recv().await?.op, OpCode::Resume);

    conn.send(&GatewayMessage::invalid_session(false)).await?;
    let identify = conn.recv().await?;
    assert_eq!(identify.op, OpCode::Identify);
    assert!(identify.d.get("seq").is_none());

    conn.dispatch("READY", 1, ready("def", &[server(1)])).await?;
    match client.expect_event("READY").await?.event {
        DomainEvent::Ready(e) => {
            assert_eq!(e.session_id, "def");
            assert!(e.reconnect);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(client.cache.servers().contains(&Snowflake::new(1)));
    Ok(())
}

#[tokio::test]
async fn test_reconnect_request_resumes() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));

    let mut conn = establish(&mut mock, &mut client, "abc").await?;
    conn.send(&GatewayMessage::reconnect()).await?;
    // Any non-1000 close keeps the session resumable
    assert_eq!(conn.wait_closed().await?, Some(4000));

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    let resume = conn.recv().await?;
    assert_eq!(resume.op, OpCode::Resume);
    assert_eq!(resume.d["session_id"], "abc");
    Ok(())
}

#[tokio::test]
async fn test_session_timeout_close_forces_identify() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));

    let conn = establish(&mut mock, &mut client, "abc").await?;
    conn.close(4009, "Session timed out").await?;
    match client.expect_event("LOST_CONNECTION").await?.event {
        DomainEvent::LostConnection(e) => assert!(!e.resumable),
        other => panic!("unexpected event: {other:?}"),
    }

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    assert_eq!(conn.recv().await?.op, OpCode::Identify);
    Ok(())
}

#[tokio::test]
async fn test_commands_wait_for_ready() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));
    client
        .gateway
        .update_presence(&PresenceUpdatePayload::new(Status::Idle))?;

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    assert_eq!(conn.recv().await?.op, OpCode::Identify);

    conn.dispatch("READY", 1, ready("abc", &[])).await?;
    client.expect_event("READY").await?;

    let presence = conn.recv().await?;
    assert_eq!(presence.op, OpCode::PresenceUpdate);
    assert_eq!(presence.d["status"], "idle");
    Ok(())
}

#[tokio::test]
async fn test_voice_handshake_reaches_connector() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));
    let mut conn = establish(&mut mock, &mut client, "abc").await?;

    client
        .gateway
        .update_voice_state(Snowflake::new(1), Some(Snowflake::new(11)), false, false)?;
    let request = conn.recv().await?;
    assert_eq!(request.op, OpCode::VoiceStateUpdate);
    assert_eq!(request.d["channel_id"], "11");

    // Server half first, then the session half
    conn.dispatch("VOICE_SERVER_UPDATE", 2, voice_server(1, "voice.example:443"))
        .await?;
    conn.dispatch("VOICE_STATE_UPDATE", 3, voice_state(1, ME, Some(11)))
        .await?;

    let attempt = client.next_voice_attempt().await?;
    assert_eq!(attempt.server_id, Snowflake::new(1));
    assert_eq!(attempt.info.session_id, "voice-session");
    assert_eq!(attempt.info.token, "voice-token");
    assert_eq!(attempt.info.endpoint, "voice.example:443");

    client.expect_event("VOICE_CHANNEL_JOINED").await?;
    Ok(())
}

#[tokio::test]
async fn test_zombied_connection_resumes() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));

    let mut conn = mock.next_connection().await?;
    conn.hello_every(100).await?;
    assert_eq!(conn.recv().await?.op, OpCode::Identify);
    conn.dispatch("READY", 1, ready("abc", &[server(1)])).await?;
    client.expect_event("READY").await?;

    // Heartbeats are no longer acknowledged from here on
    assert_eq!(conn.wait_closed().await?, Some(4000));
    match client.expect_event("LOST_CONNECTION").await?.event {
        DomainEvent::LostConnection(e) => assert!(e.resumable),
        other => panic!("unexpected event: {other:?}"),
    }

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    let resume = conn.recv().await?;
    assert_eq!(resume.op, OpCode::Resume);
    assert_eq!(resume.d["session_id"], "abc");
    assert_eq!(resume.d["seq"], 1);
    Ok(())
}

#[tokio::test]
async fn test_servers_loaded_waits_for_unavailable() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    assert_eq!(conn.recv().await?.op, OpCode::Identify);
    conn.dispatch("READY", 1, ready("abc", &[server(1), unavailable(2)]))
        .await?;
    client.expect_event("READY").await?;
    client.gateway.wait_until_ready().await?;

    assert!(!client.gateway.servers_loaded());
    assert!(
        timeout(Duration::from_millis(200), client.gateway.wait_until_servers_loaded())
            .await
            .is_err()
    );

    conn.dispatch("GUILD_CREATE", 2, server(2)).await?;
    client.expect_event("SERVER_BECAME_AVAILABLE").await?;
    timeout(STEP_TIMEOUT, client.gateway.wait_until_servers_loaded()).await??;
    assert!(client.cache.servers().contains(&Snowflake::new(2)));
    assert!(client.cache.unavailable_servers().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_server_load_gives_up_after_timeout() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut config = test_config(&mock.url());
    config.gateway.server_load_timeout = Duration::from_millis(100);
    let mut client = TestClient::spawn(&config);

    let mut conn = mock.next_connection().await?;
    conn.hello().await?;
    assert_eq!(conn.recv().await?.op, OpCode::Identify);
    conn.dispatch("READY", 1, ready("abc", &[unavailable(2)])).await?;
    client.expect_event("READY").await?;

    timeout(STEP_TIMEOUT, client.gateway.wait_until_servers_loaded()).await??;
    assert_eq!(client.cache.unavailable_servers(), vec![Snowflake::new(2)]);
    assert_eq!(client.gateway.state(), SessionState::Ready);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_command_flood_keeps_heartbeat() -> Result<()> {
    let mut mock = MockGateway::start().await?;
    let mut client = TestClient::spawn(&test_config(&mock.url()));

    let mut conn = mock.next_connection().await?;
    conn.hello_every(50).await?;
    assert_eq!(conn.recv().await?.op, OpCode::Identify);
    conn.dispatch("READY", 1, ready("abc", &[])).await?;
    client.expect_event("READY").await?;

    let acker = tokio::spawn(async move {
        for _ in 0..5 {
            conn.recv_heartbeat().await?;
        }
        anyhow::Ok(conn)
    });

    let presence = GatewayMessage::presence_update(&PresenceUpdatePayload::new(Status::Idle))?;
    let mut queued = 0u32;
    while !acker.is_finished() && queued < 50_000 {
        client.gateway.send(presence.clone())?;
        queued += 1;
        if queued % 64 == 0 {
            tokio::task::yield_now().await;
        }
    }

    acker.await??;
    assert_eq!(client.gateway.state(), SessionState::Ready);
    Ok(())
}
