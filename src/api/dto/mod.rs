//! Data Transfer Objects for REST request/response serialization.

pub mod question_dto;

pub use question_dto::*;
