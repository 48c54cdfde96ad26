use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use botarchive_registry::{RegistryConfig, SharedSecretAuth, DEFAULT_MAX_ATTEMPTS};
use botarchive_store::{FileKvStore, InMemoryKvStore, KvStore};

use crate::error::{ServerError, ServerResult};

/// Plaintext admin password, hashed at startup. Wins over the digest.
pub const ENV_ADMIN_PASSWORD: &str = "BOTARCHIVE_ADMIN_PASSWORD";
/// Hex SHA-256 digest of the admin password.
pub const ENV_ADMIN_PASSWORD_SHA256: &str = "BOTARCHIVE_ADMIN_PASSWORD_SHA256";

/// Digest of the historical default password `admin123`.
pub const DEFAULT_ADMIN_PASSWORD_SHA256: &str =
    "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9";

/// What a listing returns when the backend fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFailurePolicy {
    /// `200 []` with the degraded header set.
    #[default]
    Degrade,
    /// `500` with an error body.
    Strict,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory for the file-backed store; in-memory when unset.
    pub data_dir: Option<PathBuf>,
    pub approved_key: String,
    pub pending_key: String,
    pub admin_password_sha256: String,
    pub read_failure_policy: ReadFailurePolicy,
    pub max_write_attempts: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let registry = RegistryConfig::default();
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            data_dir: None,
            approved_key: registry.approved_key,
            pending_key: registry.pending_key,
            admin_password_sha256: DEFAULT_ADMIN_PASSWORD_SHA256.into(),
            read_failure_policy: ReadFailurePolicy::default(),
            max_write_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply the admin password overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `lookup`.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(password) = non_empty(ENV_ADMIN_PASSWORD) {
            self.admin_password_sha256 = SharedSecretAuth::from_password(&password).digest_hex();
        } else if let Some(digest) = non_empty(ENV_ADMIN_PASSWORD_SHA256) {
            self.admin_password_sha256 = digest.trim().to_lowercase();
        }
        self
    }

    pub fn uses_default_password(&self) -> bool {
        self.admin_password_sha256
            .eq_ignore_ascii_case(DEFAULT_ADMIN_PASSWORD_SHA256)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            approved_key: self.approved_key.clone(),
            pending_key: self.pending_key.clone(),
            max_write_attempts: self.max_write_attempts.max(1),
        }
    }

    pub fn auth(&self) -> ServerResult<SharedSecretAuth> {
        SharedSecretAuth::from_sha256_hex(&self.admin_password_sha256)
            .map_err(|e| ServerError::Config(format!("admin_password_sha256: {e}")))
    }

    pub fn open_store(&self) -> ServerResult<Arc<dyn KvStore>> {
        match &self.data_dir {
            Some(dir) => {
                let store = FileKvStore::open(dir)?;
                tracing::info!(dir = %dir.display(), "using file store");
                Ok(Arc::new(store))
            }
            None => {
                tracing::info!("using in-memory store; data is lost on exit");
                Ok(Arc::new(InMemoryKvStore::new()))
            }
        }
    }
}
