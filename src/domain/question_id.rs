//! Type-safe question identifier.
//!
//! [`QuestionId`] is a newtype wrapper around the store-assigned integer key
//! so that question identifiers cannot be confused with connection IDs or
//! other integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a question.
///
/// Assigned by the store on insert and immutable thereafter. Serialized as a
/// bare JSON number, which is what event payloads and REST bodies carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct QuestionId(i64);

impl QuestionId {
    /// Wraps a raw store key.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw store key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuestionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<i64> for QuestionId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<QuestionId> for i64 {
    fn from(id: QuestionId) -> Self {
        id.0
    }
}
