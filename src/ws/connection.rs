//! WebSocket connection lifecycle driver.
//!
//! One driver runs per upgraded socket. It registers with the hub, forwards
//! queued event payloads to the client, watches inbound frames for liveness
//! and deregisters on every exit path through the [`Registration`] guard.
//!
//! ```text
//! Connecting ──upgrade──▶ Open ──close / error / idle / evicted──▶ Closing ──▶ Closed
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::time::{Instant, interval_at, timeout};

use super::hub::{BroadcastHub, Registration};

/// Keepalive tuning for a single connection.
#[derive(Debug, Clone, Copy)]
pub struct KeepaliveSettings {
    /// How often a Ping is sent and liveness is checked.
    pub ping_interval: Duration,
    /// Close the connection when nothing has been read for this long.
    pub idle_timeout: Duration,
}

impl Default for KeepaliveSettings {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Why a connection left the Open state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a Close frame or the stream ended.
    PeerClosed,
    /// Reading from the socket failed.
    ReadFailed,
    /// Writing to the socket failed.
    WriteFailed,
    /// No inbound frame within the idle timeout.
    IdleTimeout,
    /// The hub dropped the connection (push failure or shutdown).
    Evicted,
}

impl CloseReason {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PeerClosed => "peer_closed",
            Self::ReadFailed => "read_failed",
            Self::WriteFailed => "write_failed",
            Self::IdleTimeout => "idle_timeout",
            Self::Evicted => "evicted",
        }
    }
}

/// Runs one connection from registration until it closes.
///
/// Inbound frames carry no meaning beyond proving the peer is alive.
/// Every socket write is bounded by the hub's push timeout, so a peer that
/// stops reading cannot pin the driver. Returns why the connection ended;
/// by then it is no longer registered and the socket has been released.
pub async fn run_connection(
    socket: WebSocket,
    hub: Arc<BroadcastHub>,
    keepalive: KeepaliveSettings,
) -> CloseReason {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (registration, mut outbound) = hub.connect();
    let connection_id = registration.id();
    let write_timeout = hub.settings().push_timeout;
    tracing::debug!(%connection_id, live = hub.connection_count(), "ws connection open");

    let period = keepalive.ping_interval.max(Duration::from_millis(10));
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut last_seen = Instant::now();

    let reason = loop {
        tokio::select! {
            queued = outbound.recv() => {
                let Some(payload) = queued else {
                    break CloseReason::Evicted;
                };
                let frame = Message::text(payload.to_string());
                if !send_bounded(&mut ws_tx, frame, write_timeout).await {
                    break CloseReason::WriteFailed;
                }
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => break CloseReason::PeerClosed,
                    Some(Ok(_)) => last_seen = Instant::now(),
                    Some(Err(e)) => {
                        tracing::debug!(%connection_id, error = %e, "ws read failed");
                        break CloseReason::ReadFailed;
                    }
                }
            }
            _ = ticker.tick() => {
                if last_seen.elapsed() >= keepalive.idle_timeout {
                    break CloseReason::IdleTimeout;
                }
                if !send_bounded(&mut ws_tx, Message::Ping(Bytes::new()), write_timeout).await {
                    break CloseReason::WriteFailed;
                }
            }
        }
    };

    close(registration, ws_tx, reason, write_timeout).await;
    tracing::debug!(%connection_id, reason = reason.as_str(), "ws connection closed");
    reason
}

/// Sends one frame, giving up after `limit`. Returns `false` on failure.
async fn send_bounded(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    message: Message,
    limit: Duration,
) -> bool {
    matches!(timeout(limit, ws_tx.send(message)).await, Ok(Ok(())))
}

/// Closing state: deregister first, then release the transport.
///
/// The farewell Close frame and the sink shutdown share one `limit`; the
/// socket is dropped when this returns either way.
async fn close(
    registration: Registration,
    mut ws_tx: SplitSink<WebSocket, Message>,
    reason: CloseReason,
    limit: Duration,
) {
    drop(registration);
    let shutdown = async {
        if matches!(reason, CloseReason::Evicted | CloseReason::IdleTimeout) {
            let _ = ws_tx.send(Message::Close(None)).await;
        }
        let _ = ws_tx.close().await;
    };
    if timeout(limit, shutdown).await.is_err() {
        tracing::debug!(reason = reason.as_str(), "ws close handshake timed out");
    }
}
