use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::category::Category;
use crate::error::TypeError;
use crate::id::RecordId;
use crate::temporal::Timestamp;

/// Version assigned to records that arrive without one.
pub const DEFAULT_VERSION: &str = "1.0.0";

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// A bot (approved) or suggestion (pending) as stored in a collection.
///
/// Both collections share this shape: approved records carry `createdAt`,
/// pending ones `suggestedAt`, and a promoted record keeps both. Fields this
/// type does not know about are kept in `extra` and written back untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub desc: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Returns `true` if `name` equals this record's name exactly.
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }
}

/// An incoming record that has not been admitted to a collection yet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Reject drafts that could never be addressed by name.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.name.trim().is_empty() {
            return Err(TypeError::EmptyName);
        }
        Ok(())
    }

    /// Admit the draft under `id`, filling the default version.
    pub fn into_record(self, id: RecordId) -> Record {
        let version = self
            .version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(default_version);
        Record {
            id,
            name: self.name,
            url: self.url,
            category: self.category,
            desc: self.desc,
            version,
            created_at: self.created_at,
            suggested_at: self.suggested_at,
            extra: self.extra,
        }
    }
}

impl From<Record> for RecordDraft {
    fn from(r: Record) -> Self {
        Self {
            id: Some(r.id),
            name: r.name,
            url: r.url,
            category: r.category,
            desc: r.desc,
            version: Some(r.version),
            created_at: r.created_at,
            suggested_at: r.suggested_at,
            extra: r.extra,
        }
    }
}

/// A partial record merged over an existing one.
///
/// Identity and bookkeeping (`id`, `createdAt`, `suggestedAt`) are accepted
/// on input so they never leak into `extra`, but [`RecordPatch::apply`]
/// leaves them untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(default, skip_serializing)]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing)]
    pub suggested_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordPatch {
    /// Overwrite the fields present in the patch, keep everything else.
    pub fn apply(&self, record: &mut Record) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(url) = &self.url {
            record.url = url.clone();
        }
        if let Some(category) = self.category {
            record.category = Some(category);
        }
        if let Some(desc) = &self.desc {
            record.desc = desc.clone();
        }
        if let Some(version) = &self.version {
            record.version = version.clone();
        }
        for (key, value) in &self.extra {
            record.extra.insert(key.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.category.is_none()
            && self.desc.is_none()
            && self.version.is_none()
            && self.extra.is_empty()
    }
}
