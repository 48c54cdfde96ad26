//! HTTP surface for Bot Archive.
//!
//! Exposes the registry over three routes: `GET /api/bots` lists a
//! collection, `POST /api/bots` runs a named action, and `GET /api/health`
//! reports liveness. All business rules live in `botarchive-registry`; this
//! crate only decodes requests and maps outcomes and errors to statuses.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ReadFailurePolicy, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::DEGRADED_HEADER;
pub use router::build_router;
pub use server::BotArchiveServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use botarchive_store::{InMemoryKvStore, KvStore, StoreError, StoreResult};

    const PASSWORD: &str = "letmein";

    struct FailingStore;

    #[async_trait]
    impl KvStore for FailingStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
            Err(StoreError::Unavailable("backend down".into()))
        }
        async fn set(&self, _key: &str, _value: &[u8]) -> StoreResult<()> {
            Err(StoreError::Unavailable("backend down".into()))
        }
        async fn delete(&self, _key: &str) -> StoreResult<bool> {
            Err(StoreError::Unavailable("backend down".into()))
        }
        async fn compare_and_swap(
            &self,
            _key: &str,
            _expected: Option<&[u8]>,
            _new: Option<&[u8]>,
        ) -> StoreResult<bool> {
            Err(StoreError::Unavailable("backend down".into()))
        }
    }

    fn config() -> ServerConfig {
        ServerConfig::default().with_overrides_from(|k| {
            (k == config::ENV_ADMIN_PASSWORD).then(|| PASSWORD.to_string())
        })
    }

    fn app_over(config: &ServerConfig, kv: Arc<dyn KvStore>) -> Router {
        build_router(AppState::with_store(config, kv).unwrap())
    }

    fn app() -> Router {
        app_over(&config(), Arc::new(InMemoryKvStore::new()))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let degraded = response
            .headers()
            .get(DEGRADED_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, degraded, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(app: &Router, body: Value) -> (StatusCode, Value) {
        post_raw(app, body.to_string()).await
    }

    async fn post_raw(app: &Router, body: String) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/bots")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, _, body) = get(&app(), "/api/health").await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn empty_listings_are_arrays() {
        let app = app();
        let (status, degraded, body) = get(&app, "/api/bots").await;
        assert_eq!(status, 200);
        assert!(degraded.is_none());
        assert_eq!(body, json!([]));
        let (_, _, body) = get(&app, "/api/bots?type=pending").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn suggest_then_approve_over_http() {
        let app = app();
        let (status, body) = post(
            &app,
            json!({ "action": "suggest", "data": { "name": "Foo", "category": "Musique" } }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        let id = body["id"].clone();

        let (_, _, pending) = get(&app, "/api/bots?type=pending").await;
        assert_eq!(pending[0]["name"], "Foo");
        assert_eq!(pending[0]["category"], "Music");
        assert!(pending[0]["suggestedAt"].is_i64());

        let (status, _) = post(
            &app,
            json!({ "action": "approve", "data": { "id": id }, "password": PASSWORD }),
        )
        .await;
        assert_eq!(status, 200);

        let (_, _, pending) = get(&app, "/api/bots?type=pending").await;
        assert_eq!(pending, json!([]));
        let (_, _, approved) = get(&app, "/api/bots").await;
        assert_eq!(approved[0]["id"], id);
        assert_eq!(approved[0]["version"], "1.0.0");
        assert!(approved[0]["createdAt"].is_i64());

        let (status, _) = post(
            &app,
            json!({ "action": "approve", "data": { "id": id }, "password": PASSWORD }),
        )
        .await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn listing_filters_by_name_and_category() {
        let app = app();
        post(
            &app,
            json!({
                "action": "add_direct",
                "password": PASSWORD,
                "data": [
                    { "name": "MusicBot", "category": "Music" },
                    { "name": "ModBot", "category": "Moderation" },
                    { "name": "Jukebox", "category": "Music" }
                ]
            }),
        )
        .await;

        let (_, _, body) = get(&app, "/api/bots?q=bot").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        let (_, _, body) = get(&app, "/api/bots?category=Musique").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        let (_, _, body) = get(&app, "/api/bots?category=Music&q=juke").await;
        assert_eq!(body[0]["name"], "Jukebox");
        let (_, _, body) = get(&app, "/api/bots?category=Tous").await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, degraded, body) = get(&app, "/api/bots?category=Sports").await;
        assert_eq!(status, 200);
        assert!(degraded.is_none());
        assert_eq!(body, json!([]));
        let (status, _, body) = get(&app, "/api/bots?type=pending&category=Sports").await;
        assert_eq!(status, 200);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn add_direct_batch_reports_count() {
        let (status, body) = post(
            &app(),
            json!({
                "action": "add_direct",
                "password": PASSWORD,
                "data": [{ "name": "A" }, { "name": "B" }]
            }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "success": true, "count": 2 }));
    }

    #[tokio::test]
    async fn wrong_password_is_401_and_writes_nothing() {
        let app = app();
        let (status, body) = post(
            &app,
            json!({ "action": "add_direct", "data": { "name": "X" }, "password": "nope" }),
        )
        .await;
        assert_eq!(status, 401);
        assert_eq!(body["success"], false);
        let (_, _, approved) = get(&app, "/api/bots").await;
        assert_eq!(approved, json!([]));
    }

    #[tokio::test]
    async fn bad_requests_are_400() {
        let app = app();
        let (status, body) = post(&app, json!({ "action": "explode", "password": PASSWORD })).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "unsupported action: explode");

        let (status, _) = post(&app, json!({ "data": {} })).await;
        assert_eq!(status, 400);

        let (status, body) = post_raw(&app, "{not json".into()).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);

        let (status, _) = post(&app, json!({ "action": "suggest", "data": { "url": "x" } })).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn duplicate_names_make_edit_ambiguous() {
        let app = app();
        post(
            &app,
            json!({
                "action": "add_direct",
                "password": PASSWORD,
                "data": [{ "name": "Twin" }, { "name": "Twin" }]
            }),
        )
        .await;
        let (status, _) = post(
            &app,
            json!({
                "action": "edit",
                "password": PASSWORD,
                "data": { "name": "Twin", "desc": "which one?" }
            }),
        )
        .await;
        assert_eq!(status, 409);
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let app = app();
        post(
            &app,
            json!({ "action": "add_direct", "password": PASSWORD, "data": { "name": "Gone" } }),
        )
        .await;
        let delete = json!({ "action": "delete", "password": PASSWORD, "data": { "name": "Gone" } });
        let (_, body) = post(&app, delete.clone()).await;
        assert_eq!(body["count"], 1);
        let (status, body) = post(&app, delete).await;
        assert_eq!(status, 200);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn failing_backend_degrades_reads() {
        let app = app_over(&config(), Arc::new(FailingStore));
        let (status, degraded, body) = get(&app, "/api/bots").await;
        assert_eq!(status, 200);
        assert_eq!(degraded.as_deref(), Some("true"));
        assert_eq!(body, json!([]));

        let (status, body) = post(&app, json!({ "action": "suggest", "data": { "name": "S" } })).await;
        assert_eq!(status, 500);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn strict_policy_surfaces_read_failures() {
        let config = ServerConfig {
            read_failure_policy: ReadFailurePolicy::Strict,
            ..config()
        };
        let app = app_over(&config, Arc::new(FailingStore));
        let (status, degraded, body) = get(&app, "/api/bots?type=pending").await;
        assert_eq!(status, 500);
        assert!(degraded.is_none());
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn options_and_cors() {
        let app = app();
        let plain = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/bots")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(plain.status(), 200);

        let preflight = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/bots")
                    .header("origin", "https://example.org")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(preflight.status(), 200);
        assert_eq!(
            preflight.headers()["access-control-allow-origin"],
            "*"
        );
        let methods = preflight.headers()["access-control-allow-methods"]
            .to_str()
            .unwrap()
            .to_string();
        assert!(methods.contains("POST"));
    }
}
