//! Collections, moderation, and the action surface of Bot Archive.
//!
//! The registry owns two record collections, pending suggestions and
//! approved records, each persisted as one blob through a
//! [`botarchive_store::KvStore`]. Every mutation is a compare-and-swap
//! retry loop over the whole blob, so concurrent writers never lose each
//! other's updates.
//!
//! # Layers
//!
//! - [`Collection`] -- ordered record list under one key, with the
//!   append/update/remove primitives
//! - [`Moderation`] -- moves suggestions from pending to approved
//! - [`Dispatcher`] -- named actions behind an [`AuthGate`]
//!
//! Anyone may suggest. Every other action requires the shared admin
//! secret.

pub mod action;
pub mod auth;
pub mod collection;
pub mod dispatch;
pub mod error;
pub mod moderation;
pub mod registry;

pub use action::{Action, ActionKind, ActionRequest, DraftPayload};
pub use auth::{hash_password, AuthGate, Credentials, SharedSecretAuth};
pub use collection::{Collection, CollectionKind, Selector, DEFAULT_MAX_ATTEMPTS};
pub use dispatch::{ActionOutcome, Dispatcher};
pub use error::{RegistryError, RegistryResult};
pub use moderation::{Moderation, SuggestionState};
pub use registry::{CategoryFilter, ListFilter, Registry, RegistryConfig};
