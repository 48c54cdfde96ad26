use thiserror::Error;

use botarchive_types::{RecordId, TypeError};

use crate::collection::CollectionKind;

/// Errors from collection, moderation, and dispatch operations.
///
/// Every variant except [`RegistryError::Store`] is raised before any write
/// happens, so a failed action leaves both collections untouched.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no record matching {target} in {collection}")]
    NotFound {
        collection: CollectionKind,
        target: String,
    },

    #[error("unauthorized")]
    Unauthorized,

    #[error("missing action")]
    MissingAction,

    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("invalid payload for {action}: {reason}")]
    InvalidPayload { action: String, reason: String },

    #[error("duplicate id {id} in {collection}")]
    DuplicateId {
        collection: CollectionKind,
        id: RecordId,
    },

    #[error("{count} records named {name:?}; use the id instead")]
    AmbiguousName { name: String, count: usize },

    #[error("write to {key} kept conflicting after {attempts} attempts")]
    WriteConflict { key: String, attempts: u32 },

    #[error("invalid record: {0}")]
    Type(#[from] TypeError),

    #[error("store error: {0}")]
    Store(#[from] botarchive_store::StoreError),
}

impl RegistryError {
    /// Returns `true` if the key-value backend itself failed.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
