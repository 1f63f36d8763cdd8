//! # askdesk
//!
//! Question/answer service with a real-time WebSocket broadcast hub.
//!
//! Clients submit questions over REST, an operator answers or escalates
//! them, and every client connected to `/ws` receives each committed change
//! as a `{type, data}` JSON frame without polling.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Upgrade + Lifecycle Driver (ws/)
//!     │
//!     ├── QuestionService (service/)
//!     ├── BroadcastHub ── ConnectionRegistry (ws/)
//!     │
//!     └── QuestionStore: in-memory or PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
