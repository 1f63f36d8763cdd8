//! WebSocket layer: connection registry, broadcast hub, lifecycle driver.
//!
//! The WebSocket endpoint at `/ws` is one-way in practice: the hub pushes
//! every question event to every open connection and inbound frames only
//! prove the client is still there.

pub mod connection;
pub mod handler;
pub mod hub;
pub mod registry;

pub use connection::{CloseReason, KeepaliveSettings};
pub use hub::{BroadcastHub, BroadcastReport, HubSettings, Registration};
pub use registry::{Connection, ConnectionId, ConnectionRegistry, Payload};
