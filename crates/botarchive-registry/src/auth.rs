use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::action::ActionKind;
use crate::error::{RegistryError, RegistryResult};

/// What the caller presented alongside an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Password(String),
    Anonymous,
}

impl Credentials {
    pub fn from_option(password: Option<String>) -> Self {
        match password {
            Some(p) if !p.is_empty() => Self::Password(p),
            _ => Self::Anonymous,
        }
    }
}

/// Decides whether a caller may run an action.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn authorize(&self, credentials: &Credentials, action: ActionKind) -> RegistryResult<()>;
}

/// Shared-secret gate: privileged actions need the admin password.
///
/// Only the SHA-256 digest of the password is held. Unprivileged actions
/// pass regardless of credentials.
#[derive(Clone)]
pub struct SharedSecretAuth {
    digest: [u8; 32],
}

impl SharedSecretAuth {
    pub fn from_password(password: &str) -> Self {
        Self {
            digest: sha256(password),
        }
    }

    /// Build from a hex-encoded SHA-256 digest.
    pub fn from_sha256_hex(hex_digest: &str) -> Result<Self, hex::FromHexError> {
        let mut digest = [0u8; 32];
        hex::decode_to_slice(hex_digest.trim(), &mut digest)?;
        Ok(Self { digest })
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    fn accepts(&self, password: &str) -> bool {
        constant_time_eq(&sha256(password), &self.digest)
    }
}

impl std::fmt::Debug for SharedSecretAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretAuth").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthGate for SharedSecretAuth {
    async fn authorize(&self, credentials: &Credentials, action: ActionKind) -> RegistryResult<()> {
        if !action.is_privileged() {
            return Ok(());
        }
        match credentials {
            Credentials::Password(p) if self.accepts(p) => Ok(()),
            _ => {
                tracing::warn!(action = %action, "rejected privileged action");
                Err(RegistryError::Unauthorized)
            }
        }
    }
}

/// Hex SHA-256 of `password`, the form stored in configuration.
pub fn hash_password(password: &str) -> String {
    hex::encode(sha256(password))
}

fn sha256(input: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(input.as_bytes()));
    out
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA-256 of "admin123".
    const ADMIN123: &str = "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9";

    #[test]
    fn hash_password_matches_known_digest() {
        assert_eq!(hash_password("admin123"), ADMIN123);
    }

    #[test]
    fn credentials_from_option() {
        assert_eq!(Credentials::from_option(None), Credentials::Anonymous);
        assert_eq!(Credentials::from_option(Some(String::new())), Credentials::Anonymous);
        assert_eq!(
            Credentials::from_option(Some("pw".into())),
            Credentials::Password("pw".into())
        );
    }

    #[test]
    fn hex_digest_round_trip() {
        let auth = SharedSecretAuth::from_sha256_hex(ADMIN123).unwrap();
        assert_eq!(auth.digest_hex(), ADMIN123);
        assert!(SharedSecretAuth::from_sha256_hex("zz").is_err());
    }

    #[tokio::test]
    async fn privileged_action_needs_password() {
        let auth = SharedSecretAuth::from_sha256_hex(ADMIN123).unwrap();
        assert!(auth
            .authorize(&Credentials::Password("admin123".into()), ActionKind::Approve)
            .await
            .is_ok());
        assert!(matches!(
            auth.authorize(&Credentials::Password("wrong".into()), ActionKind::Approve)
                .await,
            Err(RegistryError::Unauthorized)
        ));
        assert!(matches!(
            auth.authorize(&Credentials::Anonymous, ActionKind::FlushAll).await,
            Err(RegistryError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn suggest_is_open() {
        let auth = SharedSecretAuth::from_password("secret");
        assert!(auth
            .authorize(&Credentials::Anonymous, ActionKind::Suggest)
            .await
            .is_ok());
    }

    #[test]
    fn debug_hides_digest() {
        let auth = SharedSecretAuth::from_password("secret");
        assert!(!format!("{auth:?}").contains(&auth.digest_hex()));
    }
}
