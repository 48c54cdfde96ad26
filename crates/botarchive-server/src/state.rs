use std::sync::Arc;

use botarchive_registry::{AuthGate, Dispatcher, Registry};
use botarchive_store::KvStore;
use botarchive_types::UuidGenerator;

use crate::config::{ReadFailurePolicy, ServerConfig};
use crate::error::ServerResult;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub read_policy: ReadFailurePolicy,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, read_policy: ReadFailurePolicy) -> Self {
        Self {
            dispatcher,
            read_policy,
        }
    }

    /// Open the configured store and wire the registry behind the admin secret.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let kv = config.open_store()?;
        Self::with_store(config, kv)
    }

    /// Same as [`AppState::from_config`] but over a caller-supplied store.
    pub fn with_store(config: &ServerConfig, kv: Arc<dyn KvStore>) -> ServerResult<Self> {
        let auth: Arc<dyn AuthGate> = Arc::new(config.auth()?);
        if config.uses_default_password() {
            tracing::warn!("admin password is the built-in default; set BOTARCHIVE_ADMIN_PASSWORD");
        }
        let registry = Registry::with_config(
            kv,
            Arc::new(UuidGenerator),
            config.registry_config(),
        );
        Ok(Self::new(
            Dispatcher::new(Arc::new(registry), auth),
            config.read_failure_policy,
        ))
    }
}
