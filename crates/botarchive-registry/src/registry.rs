use std::sync::Arc;

use serde::{Deserialize, Serialize};

use botarchive_store::{BlobStore, KvStore};
use botarchive_types::{Category, IdGenerator, Record, UuidGenerator};

use crate::collection::{Collection, CollectionKind, DEFAULT_MAX_ATTEMPTS};
use crate::error::RegistryResult;
use crate::moderation::Moderation;

/// Store keys and write behavior for the two collections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub approved_key: String,
    pub pending_key: String,
    pub max_write_attempts: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            approved_key: "approved_bots_v3".into(),
            pending_key: "pending_suggestions_v3".into(),
            max_write_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Category narrowing of a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    Any,
    Is(Category),
    /// A label that names no category; matches nothing.
    Unmatched,
}

impl CategoryFilter {
    /// Interpret a user-supplied label. Blank, `all` and `Tous` mean no filter.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty()
            || label.eq_ignore_ascii_case("all")
            || label.eq_ignore_ascii_case("tous")
        {
            return Self::Any;
        }
        match label.parse::<Category>() {
            Ok(category) => Self::Is(category),
            Err(_) => Self::Unmatched,
        }
    }

    pub fn matches(&self, category: Option<Category>) -> bool {
        match self {
            Self::Any => true,
            Self::Is(c) => category == Some(*c),
            Self::Unmatched => false,
        }
    }
}

/// Optional narrowing of a listing: name substring and category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub query: Option<String>,
    pub category: CategoryFilter,
}

impl ListFilter {
    pub fn matches(&self, record: &Record) -> bool {
        let name_ok = match &self.query {
            Some(q) if !q.trim().is_empty() => record
                .name
                .to_lowercase()
                .contains(&q.trim().to_lowercase()),
            _ => true,
        };
        name_ok && self.category.matches(record.category)
    }

    pub fn is_empty(&self) -> bool {
        self.query.as_deref().map_or(true, |q| q.trim().is_empty()) && self.category == CategoryFilter::Any
    }
}

/// The pending and approved collections over one key-value store.
///
/// Collections are created lazily by their first write and read as empty
/// until then. The store handle is passed in explicitly; nothing here is
/// global.
#[derive(Clone, Debug)]
pub struct Registry {
    pending: Collection,
    approved: Collection,
}

impl Registry {
    /// Build a registry with UUID v7 ids and default keys.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_config(kv, Arc::new(UuidGenerator), RegistryConfig::default())
    }

    pub fn with_config(
        kv: Arc<dyn KvStore>,
        ids: Arc<dyn IdGenerator>,
        config: RegistryConfig,
    ) -> Self {
        let blob = BlobStore::new(kv);
        let pending = Collection::new(
            CollectionKind::Pending,
            config.pending_key,
            blob.clone(),
            Arc::clone(&ids),
        )
        .with_max_attempts(config.max_write_attempts);
        let approved = Collection::new(CollectionKind::Approved, config.approved_key, blob, ids)
            .with_max_attempts(config.max_write_attempts);
        Self { pending, approved }
    }

    pub fn pending(&self) -> &Collection {
        &self.pending
    }

    pub fn approved(&self) -> &Collection {
        &self.approved
    }

    pub fn collection(&self, kind: CollectionKind) -> &Collection {
        match kind {
            CollectionKind::Pending => &self.pending,
            CollectionKind::Approved => &self.approved,
        }
    }

    /// The promotion/rejection workflow over this registry's collections.
    pub fn moderation(&self) -> Moderation<'_> {
        Moderation::new(&self.pending, &self.approved)
    }

    /// Read a collection, narrowed by `filter`.
    pub async fn list(&self, kind: CollectionKind, filter: &ListFilter) -> RegistryResult<Vec<Record>> {
        let records = self.collection(kind).list().await?;
        if filter.is_empty() {
            return Ok(records);
        }
        Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
    }

    /// Delete both collections.
    pub async fn flush_all(&self) -> RegistryResult<()> {
        self.approved.clear().await?;
        self.pending.clear().await?;
        tracing::info!("flushed approved and pending collections");
        Ok(())
    }
}
