use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use botarchive_registry::{
    ActionOutcome, ActionRequest, CategoryFilter, CollectionKind, ListFilter,
};
use botarchive_types::Record;

use crate::config::ReadFailurePolicy;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Set on listings that were served empty because the backend failed.
pub const DEGRADED_HEADER: &str = "x-botarchive-degraded";

/// Query string of `GET /api/bots`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
}

impl ListQuery {
    /// `type=pending` selects suggestions; anything else is the approved list.
    pub fn collection(&self) -> CollectionKind {
        match self.kind.as_deref() {
            Some(k) if k.trim().eq_ignore_ascii_case("pending") => CollectionKind::Pending,
            _ => CollectionKind::Approved,
        }
    }

    /// Unknown categories match nothing rather than failing the read.
    pub fn filter(&self) -> ListFilter {
        ListFilter {
            query: self.q.clone().filter(|q| !q.trim().is_empty()),
            category: self
                .category
                .as_deref()
                .map(CategoryFilter::parse)
                .unwrap_or_default(),
        }
    }
}

pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ServerResult<Response> {
    let kind = query.collection();
    let filter = query.filter();
    match state.dispatcher.list(kind, &filter).await {
        Ok(records) => Ok(Json(records).into_response()),
        Err(e) if e.is_backend_failure() && state.read_policy == ReadFailurePolicy::Degrade => {
            tracing::warn!(collection = %kind, error = %e, "backend failed; serving empty listing");
            Ok(([(DEGRADED_HEADER, "true")], Json(Vec::<Record>::new())).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn action_handler(State(state): State<AppState>, body: Bytes) -> ServerResult<Json<Value>> {
    let request: ActionRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid request body: {e}")))?;
    let outcome = state.dispatcher.dispatch(request).await?;
    Ok(Json(success_body(&outcome)))
}

fn success_body(outcome: &ActionOutcome) -> Value {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    match outcome {
        ActionOutcome::Suggested(r) | ActionOutcome::Updated(r) | ActionOutcome::Approved(r) => {
            body.insert("id".into(), json!(r.id));
        }
        ActionOutcome::Added(rs) => {
            if let [only] = rs.as_slice() {
                body.insert("id".into(), json!(only.id));
            }
            body.insert("count".into(), json!(rs.len()));
        }
        ActionOutcome::Imported(rs) => {
            body.insert("count".into(), json!(rs.len()));
        }
        ActionOutcome::Removed { count, .. } => {
            body.insert("count".into(), json!(count));
        }
        ActionOutcome::Flushed => {}
    }
    Value::Object(body)
}

/// `OPTIONS /api/bots` is a no-op.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
