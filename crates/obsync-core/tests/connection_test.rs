#![allow(clippy::unwrap_used)]

mod support;

use std::time::Duration;

use obsync_core::{Command, CommandResult, Completion, ConnectionStatus, CoreError};
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use tokio::sync::oneshot;

use support::{MockTransport, connect, connected_bridge, settle, started_bridge};

const RECONNECT: Duration = Duration::from_secs(5);

// ── Explicit connect ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn connect_pulls_full_state_and_reports_success() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = started_bridge(&mock).await;
    assert_eq!(bridge.status(), ConnectionStatus::Disconnected);

    let result = connect(&bridge).await.unwrap();
    assert_eq!(
        result,
        CommandResult::Connected("OBS websocket successfully connected.".into())
    );
    assert_eq!(bridge.status(), ConnectionStatus::Connected);

    let store = bridge.store();
    let cfg = store.websocket.get();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 4455);
    assert_eq!(cfg.password, "secret");

    let options = mock.last_options().unwrap();
    assert_eq!(options.address, "127.0.0.1:4455");
    assert_eq!(options.password.unwrap().expose_secret(), "secret");

    for request in [
        "GetSceneList",
        "GetSourcesList",
        "GetCurrentScene",
        "GetPreviewScene",
        "GetStudioModeStatus",
    ] {
        assert_eq!(mock.count(request), 1, "{request} should be queried once");
    }
    assert_eq!(store.scene_list.get(), vec!["Scene1", "Scene2"]);
    assert_eq!(store.source_list.get(), vec!["Cam", "Mic"]);
    assert_eq!(
        store.program_scene.with(|s| s.as_ref().map(|s| s.name.clone())),
        Some("Scene1".to_owned())
    );
    assert!(store.preview_scene.get().is_none());
    assert!(!store.studio_mode());
    assert!(store.last_full_pull().is_some());
}

#[tokio::test(start_paused = true)]
async fn status_is_connecting_while_the_attempt_is_in_flight() {
    let mock = MockTransport::with_default_scene_state();
    mock.set_connect_delay(Duration::from_secs(2));
    let bridge = started_bridge(&mock).await;

    let (tx, rx) = oneshot::channel();
    bridge
        .dispatch(
            Command::Connect {
                host: "obs.local".into(),
                port: 4444,
                password: String::new(),
            },
            Some(Completion::from_sender(tx)),
        )
        .await;
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connecting);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(rx.await.unwrap().is_ok());
    assert_eq!(bridge.status(), ConnectionStatus::Connected);
    assert!(mock.last_options().unwrap().password.is_none());
}

#[tokio::test(start_paused = true)]
async fn connect_while_connected_changes_nothing() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;

    let err = bridge
        .execute(Command::Connect {
            host: "10.0.0.9".into(),
            port: 4444,
            password: "other".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyConnected));
    assert_eq!(err.to_string(), "Already connected! Cannot connect again.");

    let cfg = bridge.store().websocket.get();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.password, "secret");
    assert_eq!(cfg.status, ConnectionStatus::Connected);
    assert_eq!(mock.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_connect_sets_error_and_keeps_retrying() {
    let mock = MockTransport::with_default_scene_state();
    mock.fail_next_connect("connection refused");
    mock.fail_next_connect("connection refused");
    let bridge = started_bridge(&mock).await;

    let err = connect(&bridge).await.unwrap_err();
    match err {
        CoreError::ConnectionFailed { address, reason } => {
            assert_eq!(address, "127.0.0.1:4455");
            assert!(reason.contains("connection refused"));
        }
        other => panic!("expected ConnectionFailed, got {other:?}"),
    }
    assert_eq!(bridge.status(), ConnectionStatus::Error);

    tokio::time::sleep(RECONNECT).await;
    settle().await;
    assert_eq!(mock.connect_count(), 2);
    assert_eq!(bridge.status(), ConnectionStatus::Error);

    tokio::time::sleep(RECONNECT).await;
    settle().await;
    assert_eq!(mock.connect_count(), 3);
    assert_eq!(bridge.status(), ConnectionStatus::Connected);
    assert_eq!(mock.count("GetSceneList"), 1);
}

#[tokio::test(start_paused = true)]
async fn explicit_connect_after_failure_replaces_the_retry_loop() {
    let mock = MockTransport::with_default_scene_state();
    mock.fail_next_connect("connection refused");
    let bridge = started_bridge(&mock).await;

    assert!(connect(&bridge).await.is_err());
    assert_eq!(bridge.status(), ConnectionStatus::Error);

    connect(&bridge).await.unwrap();
    assert_eq!(bridge.status(), ConnectionStatus::Connected);
    assert_eq!(mock.connect_count(), 2);

    tokio::time::sleep(RECONNECT * 3).await;
    assert_eq!(mock.connect_count(), 2);
}

// ── Explicit disconnect ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn disconnect_when_disconnected_is_rejected() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = started_bridge(&mock).await;

    let err = bridge.execute(Command::Disconnect).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyDisconnected));
    assert_eq!(bridge.status(), ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn explicit_disconnect_never_reconnects() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;

    let result = bridge.execute(Command::Disconnect).await.unwrap();
    assert_eq!(
        result,
        CommandResult::Disconnected("OBS websocket successfully disconnected.".into())
    );
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Disconnected);

    tokio::time::sleep(RECONNECT * 3).await;
    assert_eq!(bridge.status(), ConnectionStatus::Disconnected);
    assert_eq!(mock.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn connect_after_disconnect_restores_reconnection() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;
    bridge.execute(Command::Disconnect).await.unwrap();
    settle().await;

    connect(&bridge).await.unwrap();
    mock.drop_connection();
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connecting);

    tokio::time::sleep(RECONNECT).await;
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connected);
    assert_eq!(mock.connect_count(), 3);
}

// ── Reconnection ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn dropped_connection_reconnects_and_pulls_again() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;

    mock.drop_connection();
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connecting);
    assert_eq!(mock.connect_count(), 1);

    tokio::time::sleep(RECONNECT).await;
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connected);
    assert_eq!(mock.connect_count(), 2);
    assert_eq!(mock.count("GetSceneList"), 2);
}

#[tokio::test(start_paused = true)]
async fn commands_during_reconnection_are_rejected() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;
    mock.fail_next_connect("still down");

    mock.drop_connection();
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connecting);

    assert!(matches!(
        connect(&bridge).await.unwrap_err(),
        CoreError::ConnectionInProgress
    ));
    assert!(matches!(
        bridge.execute(Command::Disconnect).await.unwrap_err(),
        CoreError::DisconnectWhileConnecting
    ));
    assert_eq!(bridge.status(), ConnectionStatus::Connecting);
    assert_eq!(mock.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn disconnect_after_failed_attempt_stops_the_loop() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;
    mock.fail_next_connect("still down");

    mock.drop_connection();
    tokio::time::sleep(RECONNECT).await;
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Error);
    assert_eq!(mock.connect_count(), 2);

    bridge.execute(Command::Disconnect).await.unwrap();
    settle().await;
    tokio::time::sleep(RECONNECT * 2).await;
    assert_eq!(bridge.status(), ConnectionStatus::Disconnected);
    assert_eq!(mock.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn transport_error_engages_reconnection() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;

    mock.emit_error("socket reset");
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connecting);

    tokio::time::sleep(RECONNECT).await;
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn stale_closure_is_ignored() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;

    mock.emit_closed();
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connected);

    tokio::time::sleep(RECONNECT * 2).await;
    assert_eq!(mock.connect_count(), 1);
}

// ── Liveness ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn liveness_check_corrects_a_missed_closure() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;

    mock.silently_drop();
    assert_eq!(bridge.status(), ConnectionStatus::Connected);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(bridge.status(), ConnectionStatus::Connecting);

    tokio::time::sleep(RECONNECT).await;
    settle().await;
    assert_eq!(bridge.status(), ConnectionStatus::Connected);
    assert_eq!(mock.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn liveness_never_stacks_retry_loops() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;
    mock.fail_next_connect("still down");

    mock.silently_drop();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(bridge.status(), ConnectionStatus::Connecting);

    // One attempt per interval, however many liveness ticks passed.
    tokio::time::sleep(RECONNECT).await;
    assert_eq!(mock.connect_count(), 2);
    assert_eq!(bridge.status(), ConnectionStatus::Error);

    tokio::time::sleep(RECONNECT).await;
    settle().await;
    assert_eq!(mock.connect_count(), 3);
    assert_eq!(bridge.status(), ConnectionStatus::Connected);
}

// ── Shutdown ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn shutdown_closes_transport_and_rejects_commands() {
    let mock = MockTransport::with_default_scene_state();
    let bridge = connected_bridge(&mock).await;

    bridge.shutdown().await;
    assert!(!obsync_api::ControlTransport::is_connected(mock.as_ref()));
    assert_eq!(bridge.status(), ConnectionStatus::Connected);

    let err = bridge.execute(Command::Disconnect).await.unwrap_err();
    assert!(matches!(err, CoreError::BridgeStopped));
}
