//! Promotion and rejection of pending suggestions.
//!
//! A suggestion starts in the pending collection and ends either approved
//! (moved into the approved collection) or discarded (deleted, no
//! tombstone). The two collections live under different keys, so promotion
//! claims the record out of pending first and only then appends it to
//! approved; if the append fails the record is put back. A record is
//! therefore never visible in both collections, and two racing promotions
//! of the same id yield one approved record and one `NotFound`.

use botarchive_types::{Record, RecordId};

use crate::collection::{Collection, Selector};
use crate::error::RegistryResult;

/// Where a suggestion currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestionState {
    Pending,
    Approved,
    /// Rejected, or never existed; the two are indistinguishable.
    Discarded,
}

/// The moderation workflow over a pending and an approved collection.
#[derive(Clone, Copy, Debug)]
pub struct Moderation<'a> {
    pending: &'a Collection,
    approved: &'a Collection,
}

impl<'a> Moderation<'a> {
    pub fn new(pending: &'a Collection, approved: &'a Collection) -> Self {
        Self { pending, approved }
    }

    /// Move the pending record `id` into the approved collection.
    pub async fn promote(&self, id: &RecordId) -> RegistryResult<Record> {
        let selector = Selector::Id(id.clone());
        let record = self
            .pending
            .take_where(&selector)
            .await?
            .ok_or_else(|| self.pending.not_found(&selector))?;

        match self.approved.append_record(record.clone()).await {
            Ok(approved) => {
                tracing::info!(id = %approved.id, name = %approved.name, "suggestion promoted");
                Ok(approved)
            }
            Err(err) => {
                tracing::warn!(id = %record.id, error = %err, "promotion failed, restoring suggestion");
                if let Err(restore_err) = self.pending.append_record(record).await {
                    tracing::error!(id = %id, error = %restore_err, "could not restore suggestion after failed promotion");
                }
                Err(err)
            }
        }
    }

    /// Discard the pending record `id`. Idempotent.
    pub async fn reject(&self, id: &RecordId) -> RegistryResult<bool> {
        let removed = self.pending.remove_where(&Selector::Id(id.clone())).await?;
        if removed > 0 {
            tracing::info!(id = %id, "suggestion rejected");
        }
        Ok(removed > 0)
    }

    pub async fn state(&self, id: &RecordId) -> RegistryResult<SuggestionState> {
        let selector = Selector::Id(id.clone());
        if self.pending.find(&selector).await?.is_some() {
            return Ok(SuggestionState::Pending);
        }
        if self.approved.find(&selector).await?.is_some() {
            return Ok(SuggestionState::Approved);
        }
        Ok(SuggestionState::Discarded)
    }
}
