// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_dashboard, add_user, delete_dashboard, get_dashboard, get_dashboard_url, get_studio_url,
    list_dashboards, list_user_dashboards, routes_info,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

/// Dashboards can carry whole tables, well past axum's 2MB default
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes_info))
        .route("/routes", get(routes_info))
        .route("/list_dashboards", get(list_dashboards))
        .route("/list_dashboards/", get(list_dashboards))
        .route("/add_user", post(add_user))
        .route("/list_user_dashboards/:user", get(list_user_dashboards))
        .route("/add_dashboard", post(add_dashboard))
        .route("/get_dashboard", get(get_dashboard))
        .route("/get_dashboard/:name", get(get_dashboard))
        .route("/get_dashboard/:user/:name", get(get_dashboard))
        .route("/get_dashboard_url", get(get_dashboard_url))
        .route("/get_dashboard_url/:name", get(get_dashboard_url))
        .route("/get_dashboard_url/:user/:name", get(get_dashboard_url))
        .route("/delete_dashboard", post(delete_dashboard))
        .route("/get_studio_url", get(get_studio_url))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::blob_store::BlobStore;
    use crate::application::dashboard_service::{DashboardService, PublishSettings};
    use crate::application::studio_service::{StudioService, StudioSettings};
    use crate::application::user_service::UserService;
    use crate::infrastructure::http_response::INTERNAL_ERROR_MESSAGE;
    use crate::infrastructure::memory_store::{MemoryBlobStore, MemoryUserRepository};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use bytes::Bytes;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct FailingBlobStore;

    #[async_trait]
    impl BlobStore for FailingBlobStore {
        async fn list(&self, _prefix: &str) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("bucket unavailable")
        }

        async fn put(&self, _path: &str, _body: Bytes, _content_type: &str) -> anyhow::Result<()> {
            anyhow::bail!("bucket unavailable")
        }

        async fn get(&self, _path: &str) -> anyhow::Result<Option<Bytes>> {
            anyhow::bail!("bucket unavailable")
        }

        async fn exists(&self, _path: &str) -> anyhow::Result<bool> {
            anyhow::bail!("bucket unavailable")
        }

        async fn delete(&self, _path: &str) -> anyhow::Result<bool> {
            anyhow::bail!("bucket unavailable")
        }
    }

    fn app_with_store(store: Arc<dyn BlobStore>) -> Router {
        let user_service = UserService::new(Arc::new(MemoryUserRepository::default()));
        let dashboard_service = DashboardService::new(
            store,
            user_service.clone(),
            PublishSettings {
                studio_secret: Some("S".to_string()),
                public_base_url: "https://galyleo.app".to_string(),
                viewer_url: "https://galyleo.app/published/index.html".to_string(),
            },
        );
        let studio_service = StudioService::new(StudioSettings {
            base_url: "https://galyleo.app".to_string(),
            languages: vec!["en".to_string(), "ja".to_string()],
            default_language: "en".to_string(),
            beta_hubs: vec!["beta.hub".to_string()],
        });

        build_router(Arc::new(AppState {
            user_service,
            dashboard_service,
            studio_service,
        }))
    }

    fn app() -> Router {
        app_with_store(Arc::new(MemoryBlobStore::default()))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn publish(app: &Router, user: Option<&str>, name: &str, dashboard: Value) -> Value {
        let mut body = json!({ "name": name, "dashboard": dashboard, "studio_secret": "S" });
        if let Some(user) = user {
            body["user"] = json!(user);
        }
        let (status, body) = post_json(app, "/add_dashboard", body).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body
    }

    #[tokio::test]
    async fn test_routes_info_on_root_and_routes() {
        let app = app();
        let (status, root) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        let (_, routes) = get(&app, "/routes").await;
        assert_eq!(root, routes);
        assert_eq!(root["/add_dashboard"]["method"], "POST");
        assert!(root.get("/get_studio_url").is_some());
    }

    #[tokio::test]
    async fn test_add_user_then_duplicate() {
        let app = app();
        let (status, body) = post_json(&app, "/add_user", json!({ "user": "Alice" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "userid": "Alice", "count": 1 }));

        let (status, body) = post_json(&app, "/add_user", json!({ "user": "Alice" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "User alice is already in the database" }));
    }

    #[tokio::test]
    async fn test_add_user_requires_json_body() {
        let app = app();
        let request = Request::post("/add_user")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = post_json(&app, "/add_user", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_publish_and_list_user_dashboards() {
        let app = app();
        let body = publish(&app, Some("alice"), "d1.gd.json", json!({ "a": 1 })).await;
        assert_eq!(body["url"], "https://galyleo.app/dashboards/alice/d1.gd.json");
        let view = body["view"].as_str().unwrap();
        assert!(view.starts_with("https://galyleo.app/published/index.html?dashboard="));

        publish(&app, Some("bob"), "other.gd.json", json!({})).await;

        let (status, body) = get(&app, "/list_user_dashboards/alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["d1.gd.json"]));
    }

    #[tokio::test]
    async fn test_get_dashboard_round_trip() {
        let app = app();
        let dashboard = json!({ "tables": { "t": [[1, 2], [3, 4]] }, "title": "Sales" });
        publish(&app, Some("alice"), "d1.gd.json", dashboard.clone()).await;
        publish(&app, None, "anon.gd.json", json!([true])).await;

        let (status, body) = get(&app, "/get_dashboard/alice/d1.gd.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, dashboard);

        let (_, body) = get(&app, "/get_dashboard?user=alice&name=d1.gd.json").await;
        assert_eq!(body, dashboard);

        let (_, body) = get(&app, "/get_dashboard/anon.gd.json").await;
        assert_eq!(body, json!([true]));
    }

    #[tokio::test]
    async fn test_get_dashboard_errors() {
        let app = app();
        let (status, body) = get(&app, "/get_dashboard/alice/missing.gd.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("missing.gd.json"));

        let (status, body) = get(&app, "/get_dashboard").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "name is a required parameter" }));
    }

    #[tokio::test]
    async fn test_get_dashboard_url() {
        let app = app();
        publish(&app, Some("alice"), "d1.gd.json", json!({})).await;

        let (status, body) = get(&app, "/get_dashboard_url/alice/d1.gd.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "url": "https://galyleo.app/dashboards/alice/d1.gd.json" }));

        let (status, _) = get(&app, "/get_dashboard_url/bob/d1.gd.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_secret_is_rejected_without_writing() {
        let app = app();
        let (status, body) = post_json(
            &app,
            "/add_dashboard",
            json!({
                "user": "alice",
                "name": "d1.gd.json",
                "dashboard": {},
                "studio_secret": "nope"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid studio_secret" }));

        let (_, body) = get(&app, "/list_user_dashboards/alice").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_add_dashboard_missing_fields() {
        let app = app();
        let body = json!({ "name": "d1.gd.json", "studio_secret": "S" });
        let (status, body) = post_json(&app, "/add_dashboard", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "/add_dashboard body missing required fields dashboard" })
        );
    }

    #[tokio::test]
    async fn test_delete_dashboard() {
        let app = app();
        publish(&app, Some("alice"), "d1.gd.json", json!({})).await;

        let target = json!({ "user": "alice", "name": "d1.gd.json" });
        let (status, body) = post_json(&app, "/delete_dashboard", target.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("d1.gd.json"));

        let (status, _) = post_json(&app, "/delete_dashboard", target).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(&app, "/get_dashboard/alice/d1.gd.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_dashboards_only_returns_editor_files() {
        let app = app();
        publish(&app, None, "a.gd.json", json!({})).await;
        publish(&app, None, "readme.txt", json!("text")).await;
        publish(&app, Some("alice"), "private.gd.json", json!({})).await;

        for uri in ["/list_dashboards/", "/list_dashboards"] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!(["a.gd.json"]));
        }
    }

    #[tokio::test]
    async fn test_user_folders_never_alias_anonymous_folder() {
        let app = app();
        publish(&app, None, "anon.gd.json", json!({ "v": 1 })).await;

        for uri in ["/list_user_dashboards/0", "/list_user_dashboards/%20"] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].is_string());
        }

        let (status, _) = post_json(
            &app,
            "/add_dashboard",
            json!({
                "user": "0",
                "name": "anon.gd.json",
                "dashboard": { "hijack": 1 },
                "studio_secret": "S"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(&app, "/add_user", json!({ "user": "0" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = get(&app, "/get_dashboard/anon.gd.json").await;
        assert_eq!(body, json!({ "v": 1 }));
    }

    #[tokio::test]
    async fn test_storage_failure_is_500() {
        let app = app_with_store(Arc::new(FailingBlobStore));

        let (status, body) = get(&app, "/list_user_dashboards/alice").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": INTERNAL_ERROR_MESSAGE }));

        let (status, _) = post_json(
            &app,
            "/add_dashboard",
            json!({ "name": "d1.gd.json", "dashboard": {}, "studio_secret": "S" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_get_studio_url() {
        let app = app();
        let (status, body) = get(&app, "/get_studio_url?hub=beta.hub&language=ja-JP").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "url": "https://galyleo.app/studio-ja-beta/index.html" }));

        let (_, body) = get(&app, "/get_studio_url").await;
        assert_eq!(body, json!({ "url": "https://galyleo.app/studio-en/index.html" }));
    }
}
