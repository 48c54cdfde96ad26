use async_trait::async_trait;

use crate::error::StoreResult;

/// Minimal key-value contract consumed by the collection layer.
///
/// All implementations must satisfy these invariants:
/// - `set` fully replaces the previous value ("last writer wins").
/// - `compare_and_swap` is atomic with respect to every other call on the
///   same key.
/// - The store never interprets values.
/// - Backend errors are propagated, never silently ignored.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Delete `key`. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Replace the value under `key` only if it currently equals `expected`.
    ///
    /// `expected == None` means "the key must be absent"; `new == None`
    /// deletes the key. Returns `true` if the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> StoreResult<bool>;
}
