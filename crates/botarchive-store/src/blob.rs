use std::sync::Arc;

use botarchive_types::Record;

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

/// The records of one collection together with the raw bytes they came from.
///
/// The raw bytes are the compare-and-swap expectation for a later
/// [`BlobStore::store_if_unchanged`]; `raw == None` means the key was absent.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub records: Vec<Record>,
    raw: Option<Vec<u8>>,
    recovered: bool,
}

impl Snapshot {
    /// Returns `true` if the key held a value that was not a JSON array.
    pub fn was_recovered(&self) -> bool {
        self.recovered
    }
}

/// Adapter storing one collection per key as a JSON array.
///
/// Reads never fail on content: an absent key, invalid JSON, or a non-array
/// value reads as the empty sequence, and array elements that are not
/// records are skipped while the rest are kept. Only backend failures
/// surface as errors.
#[derive(Clone)]
pub struct BlobStore {
    kv: Arc<dyn KvStore>,
}

impl BlobStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Decode a stored blob element by element, or `None` if it is not a
    /// JSON array. Elements that are not records are dropped with a warning.
    pub fn decode(key: &str, raw: &[u8]) -> Option<Vec<Record>> {
        let value: serde_json::Value = serde_json::from_slice(raw).ok()?;
        let serde_json::Value::Array(items) = value else {
            return None;
        };
        let records = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<Record>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(key, index, error = %e, "skipping stored element that is not a record");
                    None
                }
            })
            .collect();
        Some(records)
    }

    pub fn encode(records: &[Record]) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(records).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read the collection under `key`.
    pub async fn load(&self, key: &str) -> StoreResult<Vec<Record>> {
        Ok(self.snapshot(key).await?.records)
    }

    /// Read the collection under `key`, keeping the raw bytes for a later
    /// conditional write.
    pub async fn snapshot(&self, key: &str) -> StoreResult<Snapshot> {
        let raw = self.kv.get(key).await?;
        let decoded = raw.as_deref().map(|bytes| Self::decode(key, bytes));
        let recovered = matches!(decoded, Some(None));
        if recovered {
            tracing::warn!(key, "stored collection is malformed, reading as empty");
        }
        let records = decoded.flatten().unwrap_or_default();
        Ok(Snapshot {
            records,
            raw,
            recovered,
        })
    }

    /// Persist `records` under `key`, replacing whatever was there.
    pub async fn store(&self, key: &str, records: &[Record]) -> StoreResult<()> {
        let bytes = Self::encode(records)?;
        self.kv.set(key, &bytes).await
    }

    /// Persist `records` only if the key still holds what `snapshot` read.
    ///
    /// Returns `false` when another writer got there first.
    pub async fn store_if_unchanged(
        &self,
        key: &str,
        snapshot: &Snapshot,
        records: &[Record],
    ) -> StoreResult<bool> {
        let bytes = Self::encode(records)?;
        self.kv
            .compare_and_swap(key, snapshot.raw.as_deref(), Some(&bytes))
            .await
    }

    /// Delete the stored value entirely.
    pub async fn clear(&self, key: &str) -> StoreResult<()> {
        let existed = self.kv.delete(key).await?;
        tracing::debug!(key, existed, "cleared collection");
        Ok(())
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryKvStore;
    use botarchive_types::{RecordDraft, RecordId};

    fn adapter() -> (Arc<InMemoryKvStore>, BlobStore) {
        let kv = Arc::new(InMemoryKvStore::new());
        let blob = BlobStore::new(kv.clone());
        (kv, blob)
    }

    fn record(id: i64, name: &str) -> Record {
        RecordDraft::named(name).into_record(RecordId::Number(id))
    }

    #[tokio::test]
    async fn absent_key_reads_empty() {
        let (_kv, blob) = adapter();
        assert!(blob.load("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_then_load() {
        let (_kv, blob) = adapter();
        let records = vec![record(1, "A"), record(2, "B")];
        blob.store("bots", &records).await.unwrap();
        assert_eq!(blob.load("bots").await.unwrap(), records);
    }

    #[tokio::test]
    async fn malformed_values_read_empty() {
        let (kv, blob) = adapter();
        for raw in [&b"not json"[..], b"{\"a\":1}", b"42"] {
            kv.set("bots", raw).await.unwrap();
            let snap = blob.snapshot("bots").await.unwrap();
            assert!(snap.records.is_empty());
            assert!(snap.was_recovered());
        }
    }

    #[tokio::test]
    async fn undecodable_elements_are_skipped_not_fatal() {
        let (kv, blob) = adapter();
        kv.set(
            "bots",
            br#"[{"id":1,"name":"Good","category":"Music"},{"id":2,"name":"Legacy","category":"Autre"},{"name":"NoId"},{"id":"b","name":"Also good"}]"#,
        )
        .await
        .unwrap();
        let snap = blob.snapshot("bots").await.unwrap();
        assert!(!snap.was_recovered());
        let names: Vec<&str> = snap.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Also good"]);
    }

    #[tokio::test]
    async fn empty_array_is_not_recovered() {
        let (kv, blob) = adapter();
        kv.set("bots", b"[]").await.unwrap();
        let snap = blob.snapshot("bots").await.unwrap();
        assert!(snap.records.is_empty());
        assert!(!snap.was_recovered());
    }

    #[tokio::test]
    async fn conditional_store_detects_interleaved_writer() {
        let (_kv, blob) = adapter();
        let snap = blob.snapshot("bots").await.unwrap();

        // Another writer lands first.
        blob.store("bots", &[record(1, "A")]).await.unwrap();

        let ok = blob
            .store_if_unchanged("bots", &snap, &[record(2, "B")])
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(blob.load("bots").await.unwrap(), vec![record(1, "A")]);
    }

    #[tokio::test]
    async fn conditional_store_overwrites_corrupt_value() {
        let (kv, blob) = adapter();
        kv.set("bots", b"garbage").await.unwrap();
        let snap = blob.snapshot("bots").await.unwrap();
        assert!(blob
            .store_if_unchanged("bots", &snap, &[record(1, "A")])
            .await
            .unwrap());
        assert_eq!(blob.load("bots").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_key() {
        let (kv, blob) = adapter();
        blob.store("bots", &[record(1, "A")]).await.unwrap();
        blob.clear("bots").await.unwrap();
        assert!(kv.get("bots").await.unwrap().is_none());
        assert!(blob.load("bots").await.unwrap().is_empty());
        // Clearing again is fine.
        blob.clear("bots").await.unwrap();
    }
}
