use std::sync::Arc;

use botarchive_types::Record;

use crate::action::{Action, ActionKind, ActionRequest, DraftPayload};
use crate::auth::{AuthGate, Credentials};
use crate::collection::{CollectionKind, Selector};
use crate::error::{RegistryError, RegistryResult};
use crate::registry::{ListFilter, Registry};

/// What a successful action did.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    Suggested(Record),
    Added(Vec<Record>),
    Updated(Record),
    Approved(Record),
    Removed {
        collection: CollectionKind,
        count: usize,
    },
    Flushed,
    Imported(Vec<Record>),
}

impl ActionOutcome {
    /// Records created or changed by the action.
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Suggested(r) | Self::Updated(r) | Self::Approved(r) => std::slice::from_ref(r),
            Self::Added(rs) | Self::Imported(rs) => rs,
            Self::Removed { .. } | Self::Flushed => &[],
        }
    }
}

/// Routes named actions to registry operations behind the auth gate.
///
/// Checks happen in a fixed order, each before any write: the action name
/// must be present and known, the caller must be authorized for it, and the
/// payload must decode. Only then is the registry touched.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    auth: Arc<dyn AuthGate>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, auth: Arc<dyn AuthGate>) -> Self {
        Self { registry, auth }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Unauthenticated read of one collection.
    pub async fn list(&self, kind: CollectionKind, filter: &ListFilter) -> RegistryResult<Vec<Record>> {
        self.registry.list(kind, filter).await
    }

    pub async fn dispatch(&self, request: ActionRequest) -> RegistryResult<ActionOutcome> {
        let name = request
            .action
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(RegistryError::MissingAction)?;
        let kind =
            ActionKind::parse(name).ok_or_else(|| RegistryError::UnsupportedAction(name.to_string()))?;

        let credentials = Credentials::from_option(request.password);
        self.auth.authorize(&credentials, kind).await?;

        let action = Action::decode(kind, request.data)?;
        self.execute(action).await
    }

    /// Run an already-decoded action. Authorization is the caller's concern.
    pub async fn execute(&self, action: Action) -> RegistryResult<ActionOutcome> {
        let kind = action.kind();
        let outcome = match action {
            Action::Suggest(draft) => {
                ActionOutcome::Suggested(self.registry.pending().append(draft).await?)
            }
            Action::AddDirect(DraftPayload::Single(draft)) => {
                ActionOutcome::Added(vec![self.registry.approved().append(draft).await?])
            }
            Action::AddDirect(DraftPayload::Batch(drafts)) => {
                ActionOutcome::Added(self.registry.approved().append_batch(drafts).await?)
            }
            Action::Edit { name, patch } => ActionOutcome::Updated(
                self.registry
                    .approved()
                    .update_where(&Selector::Name(name), &patch)
                    .await?,
            ),
            Action::Update { id, patch } => ActionOutcome::Updated(
                self.registry
                    .approved()
                    .update_where(&Selector::Id(id), &patch)
                    .await?,
            ),
            Action::Approve { id } => {
                ActionOutcome::Approved(self.registry.moderation().promote(&id).await?)
            }
            Action::Delete { name } => ActionOutcome::Removed {
                collection: CollectionKind::Approved,
                count: self
                    .registry
                    .approved()
                    .remove_where(&Selector::Name(name))
                    .await?,
            },
            Action::DeletePending { id } => {
                let removed = self.registry.moderation().reject(&id).await?;
                ActionOutcome::Removed {
                    collection: CollectionKind::Pending,
                    count: usize::from(removed),
                }
            }
            Action::FlushAll => {
                self.registry.flush_all().await?;
                ActionOutcome::Flushed
            }
            Action::Import(drafts) => {
                ActionOutcome::Imported(self.registry.approved().replace_whole(drafts).await?)
            }
        };
        tracing::info!(action = %kind, records = outcome.records().len(), "action applied");
        Ok(outcome)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
