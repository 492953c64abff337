// ── API router ──

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Backup
        .route("/api/backup/export", get(handlers::export_backup))
        .route("/api/backup/import", post(handlers::import_backup))
        // Devices
        .route(
            "/api/devices",
            get(handlers::list_devices).post(handlers::create_device),
        )
        .route(
            "/api/devices/:id",
            put(handlers::update_device).delete(handlers::delete_device),
        )
        // VLANs
        .route("/api/vlans", post(handlers::create_vlan))
        // Subnets
        .route(
            "/api/subnets",
            get(handlers::list_subnets).post(handlers::create_subnet),
        )
        .route("/api/subnets/:id", delete(handlers::delete_subnet))
        // IP addresses
        .route("/api/ip-addresses", post(handlers::create_ip_address))
        .route("/api/ip-addresses/:id", delete(handlers::delete_ip_address))
        // Dashboard
        .route("/api/dashboard", get(handlers::dashboard))
        // Health check
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::handlers::SITE_HEADER;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use netkeep_core::MemoryStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = Arc::new(MemoryStore::new());
        store.ensure_site("home", "Home").unwrap();
        build_router(Arc::new(AppState::new(store)))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(SITE_HEADER, "home")
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(SITE_HEADER, "home")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_responds() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_site_header_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/devices")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No active site");
    }

    #[tokio::test]
    async fn unknown_site_slug_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/devices")
                    .header(SITE_HEADER, "ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn export_sets_attachment_headers() {
        let app = app();
        let response = app.oneshot(get_req("/api/backup/export")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let disposition = response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert!(disposition.starts_with("attachment; filename=\"home-backup-"));

        let body = body_json(response).await;
        assert_eq!(body["version"], "1.0");
        assert_eq!(body["site"]["slug"], "home");
    }

    #[tokio::test]
    async fn import_rejects_invalid_document() {
        let app = app();
        let response = app
            .oneshot(post_json("/api/backup/import", &json!({"bogus": true})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid backup file format"),
            "unexpected error body: {body}"
        );
    }

    #[tokio::test]
    async fn unknown_device_delete_is_not_found() {
        let app = app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/devices/not-a-real-id")
                    .header(SITE_HEADER, "home")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dashboard_reports_empty_site() {
        let app = app();
        let response = app.oneshot(get_req("/api/dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["devices"], 0);
        assert_eq!(body["subnets"], 0);
    }
}
