use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{PrometheusMetrics, create_metrics_router};

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .nest("/v1", v1::create_v1_router())
        .nest("/admin", admin::create_admin_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Full router plus the Prometheus endpoint when metrics are enabled
pub fn create_router(state: AppState, metrics: Option<(PrometheusMetrics, String)>) -> Router {
    let router = create_router_with_state(state);

    match metrics {
        Some((metrics, path)) => router.merge(create_metrics_router(metrics, &path)),
        None => router,
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::mock;
    use crate::domain::llm::{ErrorKind, MockLlmProvider};

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    fn code_request() -> Value {
        json!({
            "messages": [{"role": "user", "content": "write a tokenizer"}],
            "task_class": "code"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router_with_state(mock::healthy_state());

        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_invoke_then_cache_hit() {
        let app = create_router_with_state(mock::healthy_state());

        let (status, first) = send(&app, "POST", "/v1/invoke", Some(code_request())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["provider_used"], "A");
        assert_eq!(first["cache_hit"], false);

        let (status, second) = send(&app, "POST", "/v1/invoke", Some(code_request())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["cache_hit"], true);
        assert_eq!(second["content"], "from A");

        let (_, stats) = send(&app, "GET", "/admin/cache/stats", None).await;
        assert_eq!(stats["enabled"], true);
        assert_eq!(stats["total_entries"], 1);
        assert_eq!(stats["hits"], 1);

        let (status, cleared) = send(&app, "DELETE", "/admin/cache", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["cleared"], 1);
    }

    #[tokio::test]
    async fn test_huge_timeout_is_served() {
        let app = create_router_with_state(mock::healthy_state());
        let mut body = code_request();
        body["timeout_ms"] = json!(u64::MAX);

        let (status, result) = send(&app, "POST", "/v1/invoke", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["provider_used"], "A");
    }

    #[tokio::test]
    async fn test_exhausted_maps_to_503_with_details() {
        let app = create_router_with_state(mock::state(
            MockLlmProvider::new("A").failing(ErrorKind::UpstreamUnavailable),
            MockLlmProvider::new("B").failing(ErrorKind::UpstreamUnavailable),
        ));

        let (status, body) = send(&app, "POST", "/v1/invoke", Some(code_request())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "all_providers_exhausted");
        assert_eq!(body["error"]["details"].as_array().unwrap().len(), 2);
        assert_eq!(body["error"]["details"][0]["provider"], "A");
    }

    #[tokio::test]
    async fn test_upstream_auth_error_maps_to_502() {
        let app = create_router_with_state(mock::state(
            MockLlmProvider::new("A").failing(ErrorKind::AuthError),
            MockLlmProvider::new("B"),
        ));

        let (status, body) = send(&app, "POST", "/v1/invoke", Some(code_request())).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "auth_error");
    }

    #[tokio::test]
    async fn test_empty_messages_is_bad_request() {
        let app = create_router_with_state(mock::healthy_state());

        let (status, body) =
            send(&app, "POST", "/v1/invoke", Some(json!({"messages": []}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = create_router_with_state(mock::healthy_state());

        let (status, body) = send(&app, "POST", "/v1/invoke", Some(json!({"prompt": "hi"}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_circuits_list_and_reset() {
        let state = mock::healthy_state();
        let app = create_router_with_state(state.clone());

        let health = state.gateway.health();
        let admission = health.try_acquire("A");
        health.record_outcome(
            "A",
            admission,
            crate::domain::circuit::CallOutcome::AuthFailure,
            std::time::Duration::ZERO,
        );

        let (status, body) = send(&app, "GET", "/admin/circuits", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["circuits"][0]["provider"], "A");
        assert_eq!(body["circuits"][0]["state"], "OPEN");

        let (status, body) = send(&app, "POST", "/admin/circuits/A/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["previous_state"], "OPEN");
        assert_eq!(body["state"], "CLOSED");

        let (status, _) = send(&app, "POST", "/admin/circuits/nope/reset", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_routing_replace_and_validate() {
        let app = create_router_with_state(mock::healthy_state());

        let (status, body) = send(&app, "GET", "/admin/routing", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules"].as_array().unwrap().len(), 2);

        let replacement = json!({
            "rules": [
                {"predicate": {"type": "always"}, "target": {"provider": "B", "model": "Y2"}}
            ]
        });
        let (status, body) = send(&app, "PUT", "/admin/routing", Some(replacement)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules"][0]["target"]["model"], "Y2");

        let (_, result) = send(&app, "POST", "/v1/invoke", Some(code_request())).await;
        assert_eq!(result["provider_used"], "B");
        assert_eq!(result["model_used"], "Y2");

        let unknown = json!({
            "rules": [
                {"predicate": {"type": "always"}, "target": {"provider": "Q", "model": "Z"}}
            ]
        });
        let (status, body) = send(&app, "PUT", "/admin/routing", Some(unknown)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_routing");
    }
}
