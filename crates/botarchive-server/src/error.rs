use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use botarchive_registry::RegistryError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] botarchive_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registry(e) => registry_status(e),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Store(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn registry_status(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::Unauthorized => StatusCode::UNAUTHORIZED,
        RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
        RegistryError::MissingAction
        | RegistryError::UnsupportedAction(_)
        | RegistryError::InvalidPayload { .. }
        | RegistryError::Type(_) => StatusCode::BAD_REQUEST,
        RegistryError::DuplicateId { .. }
        | RegistryError::AmbiguousName { .. }
        | RegistryError::WriteConflict { .. } => StatusCode::CONFLICT,
        RegistryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use botarchive_registry::CollectionKind;
    use botarchive_store::StoreError;
    use botarchive_types::TypeError;

    fn status_of(e: RegistryError) -> u16 {
        ServerError::from(e).status().as_u16()
    }

    #[test]
    fn registry_errors_map_to_statuses() {
        assert_eq!(status_of(RegistryError::Unauthorized), 401);
        assert_eq!(
            status_of(RegistryError::NotFound {
                collection: CollectionKind::Pending,
                target: "id 3".into()
            }),
            404
        );
        assert_eq!(status_of(RegistryError::MissingAction), 400);
        assert_eq!(status_of(RegistryError::UnsupportedAction("x".into())), 400);
        assert_eq!(status_of(RegistryError::Type(TypeError::EmptyName)), 400);
        assert_eq!(
            status_of(RegistryError::AmbiguousName {
                name: "A".into(),
                count: 2
            }),
            409
        );
        assert_eq!(
            status_of(RegistryError::WriteConflict {
                key: "k".into(),
                attempts: 16
            }),
            409
        );
        assert_eq!(
            status_of(RegistryError::Store(StoreError::Unavailable("down".into()))),
            500
        );
    }

    #[tokio::test]
    async fn error_body_is_json() {
        let resp = ServerError::from(RegistryError::Unauthorized).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "success": false, "error": "unauthorized" }));
    }
}
