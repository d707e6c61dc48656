// ── Connection manager ──
//
// Drives the `websocket.status` state machine:
//
//   disconnected ──connect──▶ connecting ──ok──▶ connected
//                               │                   │
//                               └─fail─▶ error      ├─disconnect─▶ disconnected
//                                                   └─closed─▶ connecting (reconnect loop)
//
// Status is only ever written from this module.

use std::sync::atomic::Ordering;

use obsync_api::ConnectOptions;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

use super::{Bridge, ReconnectLoop};
use crate::error::CoreError;
use crate::model::ConnectionStatus;

const CONNECTED_MESSAGE: &str = "OBS websocket successfully connected.";
const DISCONNECTED_MESSAGE: &str = "OBS websocket successfully disconnected.";

impl Bridge {
    // ── Explicit requests ────────────────────────────────────────────

    /// Store the connection parameters and connect.
    ///
    /// Rejected without any state change while connected or connecting.
    pub(crate) async fn connect(
        &self,
        host: String,
        port: u16,
        password: String,
    ) -> Result<String, CoreError> {
        self.inner.store.websocket.try_update(|cfg| {
            match cfg.status {
                ConnectionStatus::Connected => return Err(CoreError::AlreadyConnected),
                ConnectionStatus::Connecting => return Err(CoreError::ConnectionInProgress),
                ConnectionStatus::Disconnected | ConnectionStatus::Error => {}
            }
            cfg.host = host;
            cfg.port = port;
            cfg.password = password;
            cfg.status = ConnectionStatus::Connecting;
            Ok(())
        })?;

        self.inner.suppress_reconnect.store(false, Ordering::SeqCst);
        self.cancel_reconnect().await;

        match self.attempt_connect().await {
            Ok(()) => {
                self.set_status(ConnectionStatus::Connected);
                info!("connected to OBS");
                self.full_pull().await;
                Ok(CONNECTED_MESSAGE.into())
            }
            Err(e) => {
                self.set_status(ConnectionStatus::Error);
                warn!(error = %e, "connection to OBS failed");
                self.start_reconnect_loop().await;
                Err(e)
            }
        }
    }

    /// Close the connection without triggering reconnection.
    ///
    /// Rejected without any state change while disconnected or connecting.
    pub(crate) async fn disconnect(&self) -> Result<String, CoreError> {
        self.inner
            .store
            .websocket
            .try_update(|cfg| match cfg.status {
                ConnectionStatus::Disconnected => Err(CoreError::AlreadyDisconnected),
                ConnectionStatus::Connecting => Err(CoreError::DisconnectWhileConnecting),
                ConnectionStatus::Connected | ConnectionStatus::Error => Ok(()),
            })?;

        self.inner.suppress_reconnect.store(true, Ordering::SeqCst);
        self.cancel_reconnect().await;

        self.inner.transport.disconnect().await;
        self.set_status(ConnectionStatus::Disconnected);
        info!("disconnected from OBS");
        Ok(DISCONNECTED_MESSAGE.into())
    }

    // ── Restart recovery ─────────────────────────────────────────────

    /// If the persisted status shows a session was active, try once to
    /// resume it. A failure leaves the status at `error`.
    pub(super) async fn recover_after_restart(&self) {
        let previous = self.status();
        if !previous.was_active() {
            return;
        }

        info!(%previous, "resuming session from before restart");
        self.set_status(ConnectionStatus::Connecting);
        match self.attempt_connect().await {
            Ok(()) => {
                self.set_status(ConnectionStatus::Connected);
                info!("connected to OBS");
                self.full_pull().await;
            }
            Err(e) => {
                self.set_status(ConnectionStatus::Error);
                warn!(error = %e, "could not resume previous session");
            }
        }
    }

    // ── Reconnection policy ──────────────────────────────────────────

    /// React to a connection that went away on its own.
    ///
    /// No-op while a reconnection loop is already running. After an
    /// explicit disconnect, settles on `disconnected` instead.
    pub(crate) async fn engage_reconnect(&self) {
        let mut slot = self.inner.reconnect.lock().await;
        self.engage_locked(&mut slot);
    }

    /// Liveness check: a `connected` status with no live socket means a
    /// closure was missed. Replace any pending loop with a fresh one.
    pub(crate) async fn check_liveness(&self) {
        if self.status() != ConnectionStatus::Connected || self.inner.transport.is_connected() {
            return;
        }
        warn!("Thought we were connected, but the automatic poll detected we were not. Correcting.");

        let mut slot = self.inner.reconnect.lock().await;
        if let Some(stale) = slot.take() {
            stale.cancel.cancel();
        }
        self.engage_locked(&mut slot);
    }

    fn engage_locked(&self, slot: &mut Option<ReconnectLoop>) {
        if slot.is_some() {
            return;
        }
        if self.inner.suppress_reconnect.load(Ordering::SeqCst) {
            self.set_status(ConnectionStatus::Disconnected);
            return;
        }

        self.set_status(ConnectionStatus::Connecting);
        warn!(
            interval_ms = duration_ms(self.inner.config.policy.reconnect_interval),
            "Connection closed, will attempt to reconnect periodically"
        );
        *slot = Some(self.spawn_reconnect_loop());
    }

    /// Start retrying without touching the status.
    async fn start_reconnect_loop(&self) {
        let mut slot = self.inner.reconnect.lock().await;
        if slot.is_none() {
            *slot = Some(self.spawn_reconnect_loop());
        }
    }

    async fn cancel_reconnect(&self) {
        if let Some(pending) = self.inner.reconnect.lock().await.take() {
            pending.cancel.cancel();
            debug!(loop_id = pending.id, "reconnection loop cancelled");
        }
    }

    /// Clear the slot, but only if it still holds loop `id`.
    async fn finish_reconnect(&self, id: u64) {
        let mut slot = self.inner.reconnect.lock().await;
        if slot.as_ref().is_some_and(|l| l.id == id) {
            *slot = None;
        }
    }

    fn spawn_reconnect_loop(&self) -> ReconnectLoop {
        let id = self.inner.reconnect_seq.fetch_add(1, Ordering::SeqCst);
        let cancel = self.inner.cancel.child_token();
        tokio::spawn(reconnect_task(self.clone(), id, cancel.clone()).instrument(self.span()));
        debug!(loop_id = id, "reconnection loop started");
        ReconnectLoop { id, cancel }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// One transport-level connection attempt with the stored parameters.
    /// Bypasses the explicit-connect precondition.
    async fn attempt_connect(&self) -> Result<(), CoreError> {
        let cfg = self.inner.store.websocket.get();
        let address = cfg.address();
        let options = ConnectOptions {
            address: address.clone(),
            password: (!cfg.password.is_empty()).then(|| SecretString::from(cfg.password.clone())),
            secure: cfg.secure,
        };

        let timeout = self.inner.config.policy.request_timeout;
        debug!(%address, "connecting to OBS");
        match tokio::time::timeout(timeout, self.inner.transport.connect(options)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(match CoreError::from(e) {
                CoreError::ConnectionFailed { reason, .. } => {
                    CoreError::ConnectionFailed { address, reason }
                }
                other => other,
            }),
            Err(_) => {
                self.inner.transport.disconnect().await;
                Err(CoreError::ConnectionFailed {
                    address,
                    reason: format!("no answer within {}ms", duration_ms(timeout)),
                })
            }
        }
    }

    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        let _ = self.inner.store.websocket.update(|cfg| cfg.status = status);
    }
}

/// Retry on a fixed interval until one attempt succeeds or the loop is
/// cancelled.
async fn reconnect_task(bridge: Bridge, id: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(bridge.inner.config.policy.reconnect_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                bridge.set_status(ConnectionStatus::Connecting);
                let attempt = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = bridge.attempt_connect() => result,
                };
                match attempt {
                    Ok(()) => {
                        bridge.set_status(ConnectionStatus::Connected);
                        info!(loop_id = id, "reconnected to OBS");
                        bridge.finish_reconnect(id).await;
                        bridge.full_pull().await;
                        break;
                    }
                    Err(e) => {
                        bridge.set_status(ConnectionStatus::Error);
                        debug!(loop_id = id, error = %e, "reconnection attempt failed");
                    }
                }
            }
        }
    }
}

fn duration_ms(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
