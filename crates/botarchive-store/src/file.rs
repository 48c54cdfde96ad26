use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

/// File-backed key-value store: one file per key under a data directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so readers never observe a partially written value. Mutations are
/// serialized through an async mutex, which makes `compare_and_swap` atomic
/// for every caller sharing this instance.
#[derive(Debug)]
pub struct FileKvStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKvStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "opened file store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    async fn read_path(path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_path(&self, path: PathBuf, value: Vec<u8>) -> StoreResult<()> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&value)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("write task failed: {e}")))?
    }

    async fn remove_path(path: &Path) -> StoreResult<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        Self::read_path(&path).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        self.write_path(path, value.to_vec()).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        Self::remove_path(&path).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        let current = Self::read_path(&path).await?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        match new {
            Some(value) => self.write_path(path, value.to_vec()).await?,
            None => {
                Self::remove_path(&path).await?;
            }
        }
        Ok(true)
    }
}
