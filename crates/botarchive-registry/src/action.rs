//! Named actions and their payloads.
//!
//! Requests arrive as `{ action, data, password? }`. The action name is
//! resolved to an [`ActionKind`] first (so authorization can run before the
//! payload is even looked at), then `data` is decoded into the matching
//! [`Action`] variant.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use botarchive_types::{RecordDraft, RecordId, RecordPatch};

use crate::error::{RegistryError, RegistryResult};

/// The recognized action names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Suggest,
    AddDirect,
    Edit,
    Update,
    Approve,
    Delete,
    DeletePending,
    FlushAll,
    Import,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        Self::Suggest,
        Self::AddDirect,
        Self::Edit,
        Self::Update,
        Self::Approve,
        Self::Delete,
        Self::DeletePending,
        Self::FlushAll,
        Self::Import,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suggest => "suggest",
            Self::AddDirect => "add_direct",
            Self::Edit => "edit",
            Self::Update => "update",
            Self::Approve => "approve",
            Self::Delete => "delete",
            Self::DeletePending => "delete_pending",
            Self::FlushAll => "flush_all",
            Self::Import => "import",
        }
    }

    /// Everything except public suggestion intake needs the shared secret.
    pub fn is_privileged(&self) -> bool {
        !matches!(self, Self::Suggest)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request envelope as received from a client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ActionRequest {
    pub fn new(action: ActionKind, data: Value) -> Self {
        Self {
            action: Some(action.as_str().to_string()),
            data,
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// One record or many.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DraftPayload {
    Batch(Vec<RecordDraft>),
    Single(RecordDraft),
}

impl DraftPayload {
    pub fn into_vec(self) -> Vec<RecordDraft> {
        match self {
            Self::Batch(drafts) => drafts,
            Self::Single(draft) => vec![draft],
        }
    }

    fn validate(&self) -> RegistryResult<()> {
        match self {
            Self::Batch(drafts) => drafts.iter().try_for_each(RecordDraft::validate)?,
            Self::Single(draft) => draft.validate()?,
        }
        Ok(())
    }
}

/// A decoded action with its typed payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Suggest(RecordDraft),
    AddDirect(DraftPayload),
    Edit { name: String, patch: RecordPatch },
    Update { id: RecordId, patch: RecordPatch },
    Approve { id: RecordId },
    Delete { name: String },
    DeletePending { id: RecordId },
    FlushAll,
    Import(Vec<RecordDraft>),
}

#[derive(Deserialize)]
struct IdPayload {
    id: RecordId,
}

#[derive(Deserialize)]
struct NamePayload {
    name: String,
}

/// `edit` targets `originalName` when renaming, `name` otherwise.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditPayload {
    #[serde(default)]
    original_name: Option<String>,
    #[serde(flatten)]
    patch: RecordPatch,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Suggest(_) => ActionKind::Suggest,
            Self::AddDirect(_) => ActionKind::AddDirect,
            Self::Edit { .. } => ActionKind::Edit,
            Self::Update { .. } => ActionKind::Update,
            Self::Approve { .. } => ActionKind::Approve,
            Self::Delete { .. } => ActionKind::Delete,
            Self::DeletePending { .. } => ActionKind::DeletePending,
            Self::FlushAll => ActionKind::FlushAll,
            Self::Import(_) => ActionKind::Import,
        }
    }

    /// Decode `data` into the payload `kind` expects.
    pub fn decode(kind: ActionKind, data: Value) -> RegistryResult<Self> {
        let invalid = |reason: String| RegistryError::InvalidPayload {
            action: kind.to_string(),
            reason,
        };
        let parse_err = |e: serde_json::Error| invalid(e.to_string());

        let action = match kind {
            ActionKind::Suggest => {
                let mut draft: RecordDraft = serde_json::from_value(data).map_err(parse_err)?;
                draft.validate()?;
                // Public submissions never choose their id or admission time.
                draft.id = None;
                draft.created_at = None;
                Self::Suggest(draft)
            }
            ActionKind::AddDirect => {
                let payload: DraftPayload = serde_json::from_value(data).map_err(parse_err)?;
                payload.validate()?;
                Self::AddDirect(payload)
            }
            ActionKind::Edit => {
                let payload: EditPayload = serde_json::from_value(data).map_err(parse_err)?;
                let name = payload
                    .original_name
                    .or_else(|| payload.patch.name.clone())
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| invalid("missing name".into()))?;
                Self::Edit {
                    name,
                    patch: payload.patch,
                }
            }
            ActionKind::Update => {
                let patch: RecordPatch = serde_json::from_value(data).map_err(parse_err)?;
                let id = patch.id.clone().ok_or_else(|| invalid("missing id".into()))?;
                Self::Update { id, patch }
            }
            ActionKind::Approve => {
                let p: IdPayload = serde_json::from_value(data).map_err(parse_err)?;
                Self::Approve { id: p.id }
            }
            ActionKind::Delete => {
                let p: NamePayload = serde_json::from_value(data).map_err(parse_err)?;
                Self::Delete { name: p.name }
            }
            ActionKind::DeletePending => {
                let p: IdPayload = serde_json::from_value(data).map_err(parse_err)?;
                Self::DeletePending { id: p.id }
            }
            ActionKind::FlushAll => Self::FlushAll,
            ActionKind::Import => {
                let payload: DraftPayload = serde_json::from_value(data).map_err(parse_err)?;
                payload.validate()?;
                Self::Import(payload.into_vec())
            }
        };
        Ok(action)
    }
}
