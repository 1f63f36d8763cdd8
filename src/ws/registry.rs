//! Live connection bookkeeping.
//!
//! [`ConnectionRegistry`] is the set of WebSocket connections currently
//! registered with the hub. All membership changes go through one
//! [`parking_lot::Mutex`], held only for the structural change or the
//! snapshot copy and never across an `.await`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::error::PushError;

/// Serialized event text, shared by every connection it is pushed to.
pub type Payload = Arc<str>;

/// Registry-assigned connection identity.
///
/// Monotonic within a process and never reused, so a reconnecting client
/// always gets a new identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Returns the raw sequence number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Hub-side handle to one live connection.
///
/// Holds the sending half of the connection's bounded outbound queue. The
/// WebSocket itself belongs to the lifecycle driver draining the queue.
#[derive(Debug, Clone)]
pub struct Connection {
    sender: mpsc::Sender<Payload>,
}

impl Connection {
    /// Creates a connection handle plus the receiver its driver drains.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queues `payload` for delivery, waiting at most `timeout` for room.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Closed`] if the driver is gone and
    /// [`PushError::TimedOut`] if the queue stayed full for `timeout`.
    pub async fn push(&self, payload: Payload, timeout: Duration) -> Result<(), PushError> {
        self.sender
            .send_timeout(payload, timeout)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Closed(_) => PushError::Closed,
                SendTimeoutError::Timeout(_) => PushError::TimedOut,
            })
    }
}

#[derive(Debug, Default)]
struct Members {
    next_id: u64,
    connections: BTreeMap<ConnectionId, Connection>,
}

/// Set of currently registered connections.
///
/// # Concurrency
///
/// `register`, `deregister` and `snapshot` may be called from any number of
/// tasks at once. Iteration happens on a snapshot, so a broadcast never
/// holds the lock while pushing.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    members: Mutex<Members>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection and returns its fresh identity. Never fails.
    pub fn register(&self, connection: Connection) -> ConnectionId {
        let mut members = self.members.lock();
        members.next_id = members.next_id.saturating_add(1);
        let id = ConnectionId(members.next_id);
        members.connections.insert(id, connection);
        id
    }

    /// Removes a connection if present.
    ///
    /// Idempotent: returns `false` and leaves the registry untouched when
    /// `id` is not a member.
    pub fn deregister(&self, id: ConnectionId) -> bool {
        self.members.lock().connections.remove(&id).is_some()
    }

    /// Returns a point-in-time copy of the members in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(ConnectionId, Connection)> {
        self.members
            .lock()
            .connections
            .iter()
            .map(|(id, conn)| (*id, conn.clone()))
            .collect()
    }

    /// Returns `true` if `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members.lock().connections.contains_key(&id)
    }

    /// Removes every member, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut self.members.lock().connections);
        drained.len()
    }

    /// Returns the number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.lock().connections.len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.lock().connections.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn connection() -> Connection {
        let (conn, _rx) = Connection::channel(4);
        conn
    }

    fn ids(registry: &ConnectionRegistry) -> Vec<ConnectionId> {
        registry.snapshot().into_iter().map(|(id, _)| id).collect()
    }

    #[test]
    fn register_assigns_distinct_ids() {
        let registry = ConnectionRegistry::new();
        let a = registry.register(connection());
        let b = registry.register(connection());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(a));
        assert!(registry.contains(b));
    }

    #[test]
    fn deregister_removes_member() {
        let registry = ConnectionRegistry::new();
        let a = registry.register(connection());
        assert!(registry.deregister(a));
        assert!(!registry.contains(a));
        assert!(registry.is_empty());
    }

    #[test]
    fn deregister_absent_is_noop() {
        let registry = ConnectionRegistry::new();
        let a = registry.register(connection());
        let b = registry.register(connection());
        assert!(registry.deregister(b));

        let before = ids(&registry);
        assert!(!registry.deregister(b));
        assert!(!registry.deregister(ConnectionId(999)));
        assert_eq!(ids(&registry), before);
        assert_eq!(ids(&registry), vec![a]);
    }

    #[test]
    fn snapshot_is_insertion_ordered() {
        let registry = ConnectionRegistry::new();
        let registered: Vec<_> = (0..5).map(|_| registry.register(connection())).collect();
        assert_eq!(ids(&registry), registered);
    }

    #[test]
    fn snapshot_is_detached_from_live_set() {
        let registry = ConnectionRegistry::new();
        let a = registry.register(connection());
        let snapshot = registry.snapshot();
        registry.deregister(a);
        let _b = registry.register(connection());

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.iter().any(|(id, _)| *id == a));
        assert!(!registry.contains(a));
    }

    #[test]
    fn ids_are_never_reused() {
        let registry = ConnectionRegistry::new();
        let a = registry.register(connection());
        registry.deregister(a);
        let b = registry.register(connection());
        assert!(b > a);
    }

    #[test]
    fn clear_empties_registry() {
        let registry = ConnectionRegistry::new();
        registry.register(connection());
        registry.register(connection());
        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.clear(), 0);
    }

    #[tokio::test]
    async fn push_reports_closed_and_timeout() {
        let (conn, mut rx) = Connection::channel(1);
        let timeout = Duration::from_millis(20);

        assert_eq!(conn.push(Arc::from("one"), timeout).await, Ok(()));
        // Queue is full now.
        assert_eq!(
            conn.push(Arc::from("two"), timeout).await,
            Err(PushError::TimedOut)
        );
        assert_eq!(rx.recv().await.as_deref(), Some("one"));

        drop(rx);
        assert_eq!(
            conn.push(Arc::from("three"), timeout).await,
            Err(PushError::Closed)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_register_deregister_matches_model() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();

        // Even-numbered tasks keep their connection, odd ones leave again.
        for task in 0..64u32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let id = registry.register(connection());
                tokio::task::yield_now().await;
                if task % 2 == 1 {
                    registry.deregister(id);
                    // Second removal must be harmless.
                    registry.deregister(id);
                    None
                } else {
                    Some(id)
                }
            }));
        }

        let mut expected = BTreeSet::new();
        for handle in handles {
            let Ok(kept) = handle.await else {
                panic!("task panicked");
            };
            if let Some(id) = kept {
                expected.insert(id);
            }
        }

        let actual: BTreeSet<_> = registry.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(actual, expected);
        assert_eq!(registry.len(), 32);
    }
}
