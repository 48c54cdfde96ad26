use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifier of a record, unique within its collection.
///
/// Stored collections may carry either integer ids (legacy timestamp ids) or
/// string ids; both decode. Lookups compare the canonical text form, so a
/// client sending `"42"` addresses the record stored with `42`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Returns `true` if both ids render to the same text.
    pub fn matches(&self, other: &RecordId) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(n), Self::Text(s)) | (Self::Text(s), Self::Number(n)) => {
                s.trim().parse::<i64>().map(|v| v == *n).unwrap_or(false)
            }
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({self})")
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Source of fresh record identifiers.
///
/// Collections call this whenever an incoming record has no id, and draw
/// again if the returned id is already taken.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> RecordId;
}

/// Time-ordered UUID v7 ids rendered as strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> RecordId {
        RecordId::Text(uuid::Uuid::now_v7().to_string())
    }
}

/// Monotonic integer ids starting at a given value.
///
/// Deterministic, which makes it the generator of choice in tests.
#[derive(Debug)]
pub struct SequentialGenerator {
    next: AtomicI64,
}

impl SequentialGenerator {
    pub fn new(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl Default for SequentialGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IdGenerator for SequentialGenerator {
    fn next_id(&self) -> RecordId {
        RecordId::Number(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
