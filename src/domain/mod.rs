//! Domain layer: question model and the events its mutations emit.

pub mod question;
pub mod question_event;
pub mod question_id;

pub use question::{Question, QuestionStatus};
pub use question_event::QuestionEvent;
pub use question_id::QuestionId;
