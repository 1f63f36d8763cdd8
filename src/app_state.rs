//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::OperatorAuth;
use crate::config::ServiceConfig;
use crate::persistence::QuestionStore;
use crate::service::QuestionService;
use crate::ws::{BroadcastHub, KeepaliveSettings};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Question service for all business logic.
    pub question_service: Arc<QuestionService>,
    /// Broadcast hub shared with every WebSocket connection.
    pub hub: Arc<BroadcastHub>,
    /// Operator credential check.
    pub operator_auth: Arc<OperatorAuth>,
    /// Keepalive settings handed to each new connection.
    pub keepalive: KeepaliveSettings,
}

impl AppState {
    /// Wires the hub, service and auth around an existing store.
    #[must_use]
    pub fn new(config: &ServiceConfig, store: QuestionStore) -> Self {
        let hub = Arc::new(BroadcastHub::new(config.hub_settings()));
        let question_service = Arc::new(QuestionService::new(Arc::new(store), Arc::clone(&hub)));
        Self {
            question_service,
            hub,
            operator_auth: Arc::new(OperatorAuth::new(config.operator_token.clone())),
            keepalive: config.keepalive_settings(),
        }
    }
}
