//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router over the shared state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/safety/evaluate", post(endpoints::safety::evaluate))
        .route("/knowledge", get(endpoints::knowledge::status))
        .route("/knowledge/reload", post(endpoints::knowledge::reload))
        .route("/drugs/:name", get(endpoints::drugs::lookup))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes)
        // Reports describe patient regimens; never cache them.
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::{KnowledgeSource, MAX_MEDICATIONS_PER_REQUEST};

    fn test_core_state() -> Arc<CoreState> {
        Arc::new(CoreState::load(KnowledgeSource::Embedded).unwrap())
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_generation() {
        let app = api_router(test_core_state());
        let response = app.oneshot(empty_request("GET", "/api/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["knowledge_base"]["generation"], 0);
    }

    #[tokio::test]
    async fn evaluate_returns_report() {
        let app = api_router(test_core_state());
        let req = json_request(
            "POST",
            "/api/safety/evaluate",
            serde_json::json!({ "medications": ["Tramadol", "Rivotril"] }),
        );
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["findings"][0]["severity"], "CONTRAINDICATED");
        assert_eq!(json["findings"].as_array().unwrap().len(), 1);
        assert_eq!(json["burden_scores"]["sedative_load"]["level"], "MODERATE");
        assert_eq!(json["counts"]["contraindicated"], 1);
    }

    #[tokio::test]
    async fn evaluate_treats_null_as_unresolved() {
        let app = api_router(test_core_state());
        let req = json_request(
            "POST",
            "/api/safety/evaluate",
            serde_json::json!({ "medications": [null, "Paracetamol"] }),
        );
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["unresolved_count"], 1);
        assert_eq!(json["entries"][0]["original_text"], "");
        assert_eq!(json["resolved_count"], 1);
    }

    #[tokio::test]
    async fn evaluate_rejects_oversized_list() {
        let app = api_router(test_core_state());
        let meds = vec!["Paracetamol"; MAX_MEDICATIONS_PER_REQUEST + 1];
        let req = json_request(
            "POST",
            "/api/safety/evaluate",
            serde_json::json!({ "medications": meds }),
        );
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn evaluate_accepts_list_at_cap() {
        let app = api_router(test_core_state());
        let meds = vec!["Paracetamol"; MAX_MEDICATIONS_PER_REQUEST];
        let req = json_request(
            "POST",
            "/api/safety/evaluate",
            serde_json::json!({ "medications": meds }),
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn evaluate_rejects_malformed_body() {
        let app = api_router(test_core_state());
        let req = json_request(
            "POST",
            "/api/safety/evaluate",
            serde_json::json!({ "medications": "Tramadol" }),
        );
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn drug_lookup_by_brand() {
        let app = api_router(test_core_state());
        let response = app.oneshot(empty_request("GET", "/api/drugs/Rivotril")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["drug"]["id"], "clonazepam");
        assert_eq!(json["matched_by"], "alias");
    }

    #[tokio::test]
    async fn drug_lookup_unknown_is_404() {
        let app = api_router(test_core_state());
        let response = app
            .oneshot(empty_request("GET", "/api/drugs/Unknownium"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reload_bumps_generation() {
        let core = test_core_state();
        let app = api_router(core.clone());
        let response = app
            .oneshot(empty_request("POST", "/api/knowledge/reload"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["generation"], 1);
        assert_eq!(core.knowledge().unwrap().generation, 1);
    }

    #[tokio::test]
    async fn failed_reload_returns_422_and_keeps_base() {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::new(
            crate::safety::KnowledgeBase::builtin().unwrap(),
            KnowledgeSource::Directory(dir.path().to_path_buf()),
        ));
        let app = api_router(core.clone());
        let response = app
            .oneshot(empty_request("POST", "/api/knowledge/reload"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "KNOWLEDGE_REJECTED");
        assert_eq!(core.knowledge().unwrap().generation, 0);
    }

    #[tokio::test]
    async fn knowledge_status_lists_counts() {
        let app = api_router(test_core_state());
        let response = app.oneshot(empty_request("GET", "/api/knowledge")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["critical_patterns"], 7);
        assert!(json["drugs"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = api_router(test_core_state());
        let response = app.oneshot(empty_request("GET", "/api/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
