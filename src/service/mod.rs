//! Service layer: question operations and event emission.
//!
//! [`QuestionService`] validates input, commits to the
//! [`crate::persistence::QuestionStore`] and hands the resulting events to
//! the [`crate::ws::BroadcastHub`].

pub mod question_service;

pub use question_service::QuestionService;
