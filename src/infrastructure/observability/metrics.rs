//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("llm_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric. `path` should be the matched route pattern.
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Parameters for LLM request metrics
pub struct LlmRequestMetricParams<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub duration: Duration,
    pub success: bool,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cost_micros: Option<u64>,
}

/// Record one provider attempt
pub fn record_llm_request(params: LlmRequestMetricParams) {
    let labels = [
        ("provider", params.provider.to_string()),
        ("model", params.model.to_string()),
        ("status", if params.success { "success" } else { "error" }.to_string()),
    ];

    counter!("llm_requests_total", &labels).increment(1);
    histogram!("llm_request_duration_seconds", &labels).record(params.duration.as_secs_f64());

    if let Some(tokens) = params.input_tokens {
        counter!("llm_input_tokens_total", &labels).increment(tokens);
    }

    if let Some(tokens) = params.output_tokens {
        counter!("llm_output_tokens_total", &labels).increment(tokens);
    }

    if let Some(cost) = params.cost_micros {
        counter!("llm_cost_usd_total", &labels).increment(cost);
    }

    if !params.success {
        counter!("llm_errors_total", &labels).increment(1);
    }
}

/// Record the final outcome of one gateway call (`success`, `cache_hit` or an error kind)
pub fn record_gateway_request(outcome: &str, duration: Duration) {
    let labels = [("outcome", outcome.to_string())];

    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Semantic cache lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookupResult {
    Hit,
    Miss,
    Error,
}

impl CacheLookupResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Error => "error",
        }
    }
}

pub fn record_cache_lookup(result: CacheLookupResult) {
    counter!("semantic_cache_lookups_total", "result" => result.as_str()).increment(1);
}

pub fn record_circuit_transition(provider: &str, to: &str) {
    counter!(
        "circuit_transitions_total",
        "provider" => provider.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_lookup_labels() {
        assert_eq!(CacheLookupResult::Hit.as_str(), "hit");
        assert_eq!(CacheLookupResult::Miss.as_str(), "miss");
        assert_eq!(CacheLookupResult::Error.as_str(), "error");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_gateway_request("success", Duration::from_millis(5));
        record_cache_lookup(CacheLookupResult::Miss);
        record_circuit_transition("openai", "open");
        record_llm_request(LlmRequestMetricParams {
            provider: "openai",
            model: "gpt-4o",
            duration: Duration::from_millis(500),
            success: true,
            input_tokens: Some(100),
            output_tokens: Some(50),
            cost_micros: Some(1250),
        });
    }
}
