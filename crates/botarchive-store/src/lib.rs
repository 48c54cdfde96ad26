//! Key-value storage for Bot Archive collections.
//!
//! Every collection lives under one key as a single serialized JSON array.
//! This crate provides the minimal key-value contract the rest of the
//! system consumes, two backends for it, and the blob adapter that turns
//! raw values into record sequences.
//!
//! # Storage Backends
//!
//! All backends implement the [`KvStore`] trait:
//!
//! - [`InMemoryKvStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileKvStore`] -- one file per key under a data directory
//!
//! # Design Rules
//!
//! 1. The store never interprets values -- it is a pure key-value store.
//! 2. `compare_and_swap` is the only multi-step primitive; it is atomic
//!    with respect to every other call on the same store.
//! 3. Backend failures are propagated as [`StoreError`]. Absent or corrupt
//!    collection blobs are not failures: [`BlobStore`] reads them as empty.

pub mod blob;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use blob::{BlobStore, Snapshot};
pub use error::{StoreError, StoreResult};
pub use file::FileKvStore;
pub use memory::InMemoryKvStore;
pub use traits::KvStore;
