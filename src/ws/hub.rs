//! Fan-out of question events to every live connection.
//!
//! [`BroadcastHub`] owns the [`ConnectionRegistry`]. A broadcast serializes
//! the event once, snapshots the registry, releases the lock and then pushes
//! to every member concurrently. A member whose push fails is deregistered;
//! nothing else notices.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc;

use super::registry::{Connection, ConnectionId, ConnectionRegistry, Payload};
use crate::domain::QuestionEvent;

/// Delivery tuning for the hub.
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    /// Upper bound on a single push before it counts as failed.
    pub push_timeout: Duration,
    /// Depth of each connection's outbound queue.
    pub queue_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            push_timeout: Duration::from_secs(5),
            queue_capacity: 64,
        }
    }
}

/// Outcome of one [`BroadcastHub::broadcast`] call. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the payload was queued on.
    pub delivered: usize,
    /// Connections that failed and were deregistered.
    pub dropped: usize,
}

/// Single-process broadcast hub.
///
/// Cheap to share behind an `Arc`; every mutation handler and every
/// lifecycle driver holds the same instance.
#[derive(Debug)]
pub struct BroadcastHub {
    registry: Arc<ConnectionRegistry>,
    settings: HubSettings,
}

impl BroadcastHub {
    /// Creates a hub with an empty registry.
    #[must_use]
    pub fn new(settings: HubSettings) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            settings,
        }
    }

    /// Returns the registry the hub broadcasts to.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns the delivery settings.
    #[must_use]
    pub const fn settings(&self) -> HubSettings {
        self.settings
    }

    /// Opens a new connection: creates its outbound queue and registers it.
    ///
    /// The returned [`Registration`] deregisters on drop; the receiver is
    /// what the connection's driver drains onto the wire.
    #[must_use]
    pub fn connect(&self) -> (Registration, mpsc::Receiver<Payload>) {
        let (connection, receiver) = Connection::channel(self.settings.queue_capacity);
        let id = self.registry.register(connection);
        let registration = Registration {
            id,
            registry: Arc::clone(&self.registry),
        };
        (registration, receiver)
    }

    /// Broadcasts `event` to every registered connection.
    ///
    /// Never fails. A serialization error is logged and the event dropped;
    /// push failures deregister the affected connection only.
    pub async fn broadcast(&self, event: &QuestionEvent) -> BroadcastReport {
        let payload: Payload = match serde_json::to_string(event) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                tracing::error!(
                    event_type = event.event_type_str(),
                    error = %e,
                    "failed to serialize event, dropping it"
                );
                return BroadcastReport::default();
            }
        };

        let report = self.broadcast_payload(payload).await;
        tracing::debug!(
            event_type = event.event_type_str(),
            question_id = %event.question_id(),
            delivered = report.delivered,
            dropped = report.dropped,
            "event broadcast"
        );
        report
    }

    /// Pushes an already serialized payload to every registered connection.
    pub async fn broadcast_payload(&self, payload: Payload) -> BroadcastReport {
        let members = self.registry.snapshot();
        if members.is_empty() {
            return BroadcastReport::default();
        }

        let timeout = self.settings.push_timeout;
        let pushes = members.iter().map(|(id, conn)| {
            let payload = Arc::clone(&payload);
            async move { (*id, conn.push(payload, timeout).await) }
        });

        let mut report = BroadcastReport::default();
        for (id, outcome) in join_all(pushes).await {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(connection_id = %id, error = %e, "dropping connection");
                    self.registry.deregister(id);
                    report.dropped += 1;
                }
            }
        }
        report
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Deregisters every connection, closing their outbound queues.
    ///
    /// Drivers observe the closed queue and shut their sockets down.
    pub fn close_all(&self) -> usize {
        let closed = self.registry.clear();
        tracing::info!(closed, "closed all websocket connections");
        closed
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(HubSettings::default())
    }
}

/// Scope guard for one registered connection.
///
/// Dropping it deregisters the connection, so every exit path of a
/// lifecycle driver releases its registry entry.
#[derive(Debug)]
pub struct Registration {
    id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
}

impl Registration {
    /// Returns the identity assigned at registration.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Question, QuestionId, QuestionStatus};

    fn hub() -> BroadcastHub {
        BroadcastHub::new(HubSettings {
            push_timeout: Duration::from_millis(50),
            queue_capacity: 8,
        })
    }

    fn status_event(id: i64, status: QuestionStatus) -> QuestionEvent {
        let mut question = Question::new(QuestionId::new(id), "q".to_string());
        question.status = status;
        QuestionEvent::status_updated(&question)
    }

    fn drain(rx: &mut mpsc::Receiver<Payload>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            out.push(payload.to_string());
        }
        out
    }

    #[tokio::test]
    async fn broadcast_without_connections_is_noop() {
        let hub = hub();
        let report = hub
            .broadcast(&status_event(1, QuestionStatus::Pending))
            .await;
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn every_connection_receives_exactly_one_copy() {
        let hub = hub();
        let mut peers: Vec<_> = (0..4).map(|_| hub.connect()).collect();

        let event = status_event(1, QuestionStatus::Escalated);
        let report = hub.broadcast(&event).await;
        assert_eq!(report.delivered, 4);
        assert_eq!(report.dropped, 0);
        assert_eq!(hub.connection_count(), 4);

        let Ok(expected) = serde_json::to_string(&event) else {
            panic!("serializable");
        };
        for (_, rx) in &mut peers {
            assert_eq!(drain(rx), vec![expected.clone()]);
        }
    }

    #[tokio::test]
    async fn severed_connection_is_pruned_others_still_receive() {
        let hub = hub();
        let (_reg_a, mut rx_a) = hub.connect();
        let (reg_b, rx_b) = hub.connect();
        let (_reg_c, mut rx_c) = hub.connect();
        let severed = reg_b.id();

        // Transport gone but the guard is still alive, as when the writer
        // half dies before the driver notices.
        drop(rx_b);

        let report = hub
            .broadcast(&status_event(2, QuestionStatus::Answered))
            .await;
        assert_eq!(report.delivered, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(hub.connection_count(), 2);
        assert!(!hub.registry().contains(severed));
        assert_eq!(drain(&mut rx_a).len(), 1);
        assert_eq!(drain(&mut rx_c).len(), 1);

        // Dropping the guard later is harmless.
        drop(reg_b);
        assert_eq!(hub.connection_count(), 2);
    }

    #[tokio::test]
    async fn stalled_connection_times_out_and_is_pruned() {
        let hub = BroadcastHub::new(HubSettings {
            push_timeout: Duration::from_millis(20),
            queue_capacity: 1,
        });
        let (_reg_slow, _rx_slow) = hub.connect();
        let (_reg_fast, mut rx_fast) = hub.connect();

        let first = hub.broadcast(&status_event(1, QuestionStatus::Pending)).await;
        assert_eq!(first.delivered, 2);
        // The fast peer keeps up; the slow one never reads.
        assert_eq!(drain(&mut rx_fast).len(), 1);

        let second = hub
            .broadcast(&status_event(1, QuestionStatus::Escalated))
            .await;
        assert_eq!(second.delivered, 1);
        assert_eq!(second.dropped, 1);
        assert_eq!(hub.connection_count(), 1);
        assert_eq!(drain(&mut rx_fast).len(), 1);
    }

    #[tokio::test]
    async fn sequential_broadcasts_arrive_in_order() {
        let hub = hub();
        let mut peers: Vec<_> = (0..3).map(|_| hub.connect()).collect();

        let e1 = status_event(1, QuestionStatus::Escalated);
        let e2 = status_event(1, QuestionStatus::Answered);
        hub.broadcast(&e1).await;
        hub.broadcast(&e2).await;

        let (Ok(j1), Ok(j2)) = (serde_json::to_string(&e1), serde_json::to_string(&e2)) else {
            panic!("serializable");
        };
        for (_, rx) in &mut peers {
            assert_eq!(drain(rx), vec![j1.clone(), j2.clone()]);
        }
    }

    #[tokio::test]
    async fn registration_guard_deregisters_on_drop() {
        let hub = hub();
        let (registration, _rx) = hub.connect();
        let id = registration.id();
        assert!(hub.registry().contains(id));

        drop(registration);
        assert!(!hub.registry().contains(id));
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn close_all_closes_every_queue() {
        let hub = hub();
        let (_reg_a, mut rx_a) = hub.connect();
        let (_reg_b, mut rx_b) = hub.connect();

        assert_eq!(hub.close_all(), 2);
        assert_eq!(hub.connection_count(), 0);
        assert!(rx_a.recv().await.is_none());
        assert!(rx_b.recv().await.is_none());
    }

    #[tokio::test]
    async fn connection_registered_after_broadcast_gets_nothing() {
        let hub = hub();
        hub.broadcast(&status_event(1, QuestionStatus::Pending)).await;
        let (_reg, mut rx) = hub.connect();
        assert!(drain(&mut rx).is_empty());
    }
}
