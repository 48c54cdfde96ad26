//! A typed, ordered collection of records stored under one key.
//!
//! Every mutating operation is a read-modify-write cycle: load a snapshot,
//! change the records in memory, and write back only if the stored blob is
//! still the one that was read. A lost race reloads and reapplies the
//! change, so concurrent writers never drop each other's updates.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use botarchive_store::BlobStore;
use botarchive_types::{IdGenerator, Record, RecordDraft, RecordId, RecordPatch, Timestamp};

use crate::error::{RegistryError, RegistryResult};

/// Attempts a mutation makes before reporting [`RegistryError::WriteConflict`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Which of the two collections a record lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Suggestions awaiting moderation.
    Pending,
    /// The public list.
    Approved,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

/// Addresses records by id or by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Id(RecordId),
    Name(String),
}

impl Selector {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Id(id) => record.id.matches(id),
            Self::Name(name) => record.has_name(name),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "name {name:?}"),
        }
    }
}

/// Outcome of one in-memory pass over the records.
enum Pass<T> {
    /// The records changed and must be written back.
    Write(T),
    /// Nothing changed; skip the write.
    Keep(T),
}

/// One named collection with its id source.
#[derive(Clone)]
pub struct Collection {
    kind: CollectionKind,
    key: String,
    blob: BlobStore,
    ids: Arc<dyn IdGenerator>,
    max_attempts: u32,
}

impl Collection {
    pub fn new(
        kind: CollectionKind,
        key: impl Into<String>,
        blob: BlobStore,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            kind,
            key: key.into(),
            blob,
            ids,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the conflict retry limit (at least one attempt is always made).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // ---- Reads ----

    pub async fn list(&self) -> RegistryResult<Vec<Record>> {
        Ok(self.blob.load(&self.key).await?)
    }

    pub async fn find(&self, selector: &Selector) -> RegistryResult<Option<Record>> {
        let records = self.list().await?;
        Ok(records.into_iter().find(|r| selector.matches(r)))
    }

    // ---- Appends ----

    /// Admit one record at the end of the collection.
    pub async fn append(&self, draft: RecordDraft) -> RegistryResult<Record> {
        self.mutate(|records| {
            let now = Timestamp::now();
            self.admit(records, draft.clone(), now).map(Pass::Write)
        })
        .await
    }

    /// Admit several records in one write, preserving their order.
    pub async fn append_batch(&self, drafts: Vec<RecordDraft>) -> RegistryResult<Vec<Record>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        self.mutate(|records| {
            let now = Timestamp::now();
            let admitted = drafts
                .iter()
                .cloned()
                .map(|d| self.admit(records, d, now))
                .collect::<RegistryResult<Vec<_>>>()?;
            Ok(Pass::Write(admitted))
        })
        .await
    }

    /// Append an already-identified record, keeping its id.
    pub async fn append_record(&self, record: Record) -> RegistryResult<Record> {
        self.mutate(|records| {
            if records.iter().any(|r| r.id.matches(&record.id)) {
                return Err(RegistryError::DuplicateId {
                    collection: self.kind,
                    id: record.id.clone(),
                });
            }
            let mut record = record.clone();
            self.stamp(&mut record, Timestamp::now());
            records.push(record.clone());
            Ok(Pass::Write(record))
        })
        .await
    }

    /// Replace the whole collection with `drafts`.
    pub async fn replace_whole(&self, drafts: Vec<RecordDraft>) -> RegistryResult<Vec<Record>> {
        self.mutate(|records| {
            records.clear();
            let now = Timestamp::now();
            let admitted = drafts
                .iter()
                .cloned()
                .map(|d| self.admit(records, d, now))
                .collect::<RegistryResult<Vec<_>>>()?;
            Ok(Pass::Write(admitted))
        })
        .await
    }

    // ---- Removal ----

    /// Remove the records matching `selector`. Returns how many were removed.
    ///
    /// Idempotent: once nothing matches, no write happens. A name matching
    /// more than one record is rejected as ambiguous.
    pub async fn remove_where(&self, selector: &Selector) -> RegistryResult<usize> {
        self.mutate(|records| {
            let count = self.count_unambiguous(records, selector)?;
            if count == 0 {
                return Ok(Pass::Keep(0));
            }
            records.retain(|r| !selector.matches(r));
            Ok(Pass::Write(count))
        })
        .await
    }

    /// Remove and return the first record matching `selector`.
    pub async fn take_where(&self, selector: &Selector) -> RegistryResult<Option<Record>> {
        self.mutate(|records| {
            let position = records.iter().position(|r| selector.matches(r));
            match position {
                Some(index) => Ok(Pass::Write(Some(records.remove(index)))),
                None => Ok(Pass::Keep(None)),
            }
        })
        .await
    }

    // ---- Update ----

    /// Merge `patch` over the record matching `selector`.
    pub async fn update_where(
        &self,
        selector: &Selector,
        patch: &RecordPatch,
    ) -> RegistryResult<Record> {
        self.mutate(|records| {
            self.count_unambiguous(records, selector)?;
            let record = records
                .iter_mut()
                .find(|r| selector.matches(r))
                .ok_or_else(|| self.not_found(selector))?;
            if patch.is_empty() {
                return Ok(Pass::Keep(record.clone()));
            }
            patch.apply(record);
            Ok(Pass::Write(record.clone()))
        })
        .await
    }

    /// Delete the stored value entirely.
    pub async fn clear(&self) -> RegistryResult<()> {
        Ok(self.blob.clear(&self.key).await?)
    }

    pub(crate) fn not_found(&self, selector: &Selector) -> RegistryError {
        RegistryError::NotFound {
            collection: self.kind,
            target: selector.to_string(),
        }
    }

    // ---- Internals ----

    async fn mutate<T, F>(&self, mut pass: F) -> RegistryResult<T>
    where
        F: FnMut(&mut Vec<Record>) -> RegistryResult<Pass<T>> + Send,
        T: Send,
    {
        for attempt in 1..=self.max_attempts {
            let mut snapshot = self.blob.snapshot(&self.key).await?;
            let mut records = std::mem::take(&mut snapshot.records);
            match pass(&mut records)? {
                Pass::Keep(out) => return Ok(out),
                Pass::Write(out) => {
                    if self
                        .blob
                        .store_if_unchanged(&self.key, &snapshot, &records)
                        .await?
                    {
                        return Ok(out);
                    }
                    tracing::debug!(key = %self.key, attempt, "collection changed underneath, retrying");
                    tokio::task::yield_now().await;
                }
            }
        }
        tracing::warn!(key = %self.key, attempts = self.max_attempts, "giving up on contended write");
        Err(RegistryError::WriteConflict {
            key: self.key.clone(),
            attempts: self.max_attempts,
        })
    }

    fn admit(
        &self,
        records: &mut Vec<Record>,
        mut draft: RecordDraft,
        now: Timestamp,
    ) -> RegistryResult<Record> {
        let id = match draft.id.take() {
            Some(id) if records.iter().any(|r| r.id.matches(&id)) => {
                return Err(RegistryError::DuplicateId {
                    collection: self.kind,
                    id,
                });
            }
            Some(id) => id,
            None => self.fresh_id(records),
        };
        let mut record = draft.into_record(id);
        self.stamp(&mut record, now);
        records.push(record.clone());
        Ok(record)
    }

    fn fresh_id(&self, records: &[Record]) -> RecordId {
        loop {
            let id = self.ids.next_id();
            if !records.iter().any(|r| r.id.matches(&id)) {
                return id;
            }
        }
    }

    fn stamp(&self, record: &mut Record, now: Timestamp) {
        match self.kind {
            CollectionKind::Pending => {
                record.suggested_at.get_or_insert(now);
            }
            CollectionKind::Approved => {
                record.created_at.get_or_insert(now);
            }
        }
    }

    fn count_unambiguous(&self, records: &[Record], selector: &Selector) -> RegistryResult<usize> {
        let count = records.iter().filter(|r| selector.matches(r)).count();
        match selector {
            Selector::Name(name) if count > 1 => Err(RegistryError::AmbiguousName {
                name: name.clone(),
                count,
            }),
            _ => Ok(count),
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
