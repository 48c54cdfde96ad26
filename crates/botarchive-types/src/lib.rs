//! Foundation types for Bot Archive.
//!
//! This crate provides the record model shared by every other Bot Archive
//! crate: the bot/suggestion record, its identifier, the fixed category set,
//! and the millisecond timestamps stamped on admission and submission.
//!
//! # Key Types
//!
//! - [`Record`] -- a stored bot or suggestion, always carrying an id
//! - [`RecordDraft`] -- an incoming record whose id may still be missing
//! - [`RecordPatch`] -- a partial record merged over an existing one
//! - [`RecordId`] -- string or integer identifier, unique within a collection
//! - [`IdGenerator`] -- injectable id source ([`UuidGenerator`], [`SequentialGenerator`])
//! - [`Category`] -- Moderation, Music, Utility, Entertainment
//! - [`Timestamp`] -- milliseconds since the Unix epoch

pub mod category;
pub mod error;
pub mod id;
pub mod record;
pub mod temporal;

pub use category::Category;
pub use error::TypeError;
pub use id::{IdGenerator, RecordId, SequentialGenerator, UuidGenerator};
pub use record::{Record, RecordDraft, RecordPatch, DEFAULT_VERSION};
pub use temporal::Timestamp;
