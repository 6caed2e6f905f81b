//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    CacheLookupResult, LlmRequestMetricParams, PrometheusMetrics, create_metrics_router,
    init_metrics, record_cache_lookup, record_circuit_transition, record_gateway_request,
    record_http_request, record_llm_request,
};
