//! Gateway orchestration
//!
//! `execute` is the single entry point for model invocations: cache check,
//! routing, circuit admission, provider calls with retry, cost accounting and
//! cache population. All retry and fallback policy lives here.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::circuit::{Admission, CallOutcome};
use crate::domain::gateway::{CandidateFailure, GatewayConfig, GatewayError, InvocationResult};
use crate::domain::llm::{ErrorKind, LlmProvider, LlmRequest, LlmResponse, ProviderError, Usage, invoke};
use crate::domain::routing::{ProviderTarget, RoutingConfig, RoutingEngine, RoutingError};
use crate::domain::semantic_cache::{CacheHit, CachedResponse};
use crate::domain::usage::PricingTable;
use crate::infrastructure::circuit::HealthTracker;
use crate::infrastructure::llm::ProviderRegistry;
use crate::infrastructure::observability::{
    LlmRequestMetricParams, record_gateway_request, record_llm_request,
};

use super::SemanticCacheService;

/// Top-level gateway orchestrator
#[derive(Debug)]
pub struct GatewayService {
    routing: ArcSwap<RoutingConfig>,
    providers: ProviderRegistry,
    health: Arc<HealthTracker>,
    cache: Option<Arc<SemanticCacheService>>,
    pricing: PricingTable,
    config: GatewayConfig,
}

impl GatewayService {
    /// Create a gateway. Fails when the routing config is invalid or names an
    /// unregistered provider.
    pub fn new(
        routing: RoutingConfig,
        providers: ProviderRegistry,
        health: Arc<HealthTracker>,
    ) -> Result<Self, RoutingError> {
        validate_routing(&routing, &providers)?;

        Ok(Self {
            routing: ArcSwap::from_pointee(routing),
            providers,
            health,
            cache: None,
            pricing: PricingTable::default(),
            config: GatewayConfig::default(),
        })
    }

    pub fn with_cache(mut self, cache: Arc<SemanticCacheService>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Current routing snapshot
    pub fn routing(&self) -> Arc<RoutingConfig> {
        self.routing.load_full()
    }

    /// Validate and atomically replace the routing config.
    /// In-flight calls keep the snapshot they started with.
    pub fn update_routing(&self, routing: RoutingConfig) -> Result<(), RoutingError> {
        validate_routing(&routing, &self.providers)?;

        info!(
            rules = routing.rules.rules().len(),
            fallbacks = routing.fallback_chain.targets().len(),
            "Routing config replaced"
        );
        self.routing.store(Arc::new(routing));

        Ok(())
    }

    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }

    pub fn cache(&self) -> Option<&Arc<SemanticCacheService>> {
        self.cache.as_ref()
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Serve `request` from cache or the first candidate that succeeds
    pub async fn execute(&self, request: LlmRequest) -> Result<InvocationResult, GatewayError> {
        let started = Instant::now();
        let result = self.run(&request, &request.correlation_id, started).await;

        let outcome = match &result {
            Ok(r) if r.cache_hit => "cache_hit",
            Ok(_) => "success",
            Err(e) => e.kind.as_str(),
        };
        record_gateway_request(outcome, started.elapsed());

        result
    }

    async fn run(
        &self,
        request: &LlmRequest,
        correlation_id: &str,
        started: Instant,
    ) -> Result<InvocationResult, GatewayError> {
        if request.messages.is_empty() {
            return Err(GatewayError::invalid_request(
                "request must contain at least one message",
            ));
        }

        let deadline = self.deadline_for(request, started)?;

        if let Some(cache) = &self.cache {
            match tokio::time::timeout_at(deadline, cache.lookup(request)).await {
                Ok(Some(hit)) => {
                    return Ok(cached_result(hit, correlation_id, started));
                }
                Ok(None) => {}
                Err(_) => {
                    warn!(correlation_id = %correlation_id, "Deadline reached during cache lookup");
                    return Err(GatewayError::deadline_exceeded(Vec::new()));
                }
            }
        }

        let routing = self.routing.load_full();
        let candidates = RoutingEngine::new(&routing).resolve(request);

        debug!(
            correlation_id = %correlation_id,
            candidates = %candidates.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            "Resolved candidates"
        );

        let mut failures: Vec<CandidateFailure> = Vec::new();
        let mut excluded: HashMap<String, ErrorKind> = HashMap::new();
        let mut attempts = 0u32;

        for target in &candidates {
            if Instant::now() >= deadline {
                warn!(correlation_id = %correlation_id, "Deadline reached before trying all candidates");
                return Err(GatewayError::deadline_exceeded(failures));
            }

            if let Some(kind) = excluded.get(&target.provider) {
                debug!(provider = %target.provider, model = %target.model, kind = %kind, "Skipping provider after earlier failure");
                failures.push(CandidateFailure::skipped(target, *kind));
                continue;
            }

            let Some(provider) = self.providers.get(&target.provider) else {
                let error = ProviderError::unavailable(&target.provider, "provider not registered");
                failures.push(CandidateFailure::error(target, &error));
                continue;
            };

            let admission = self.health.try_acquire(&target.provider);

            if !admission.is_admitted() {
                debug!(provider = %target.provider, "Circuit open, skipping candidate");
                failures.push(CandidateFailure::circuit_open(target));
                continue;
            }

            match self
                .attempt(provider.as_ref(), target, request, deadline, admission, &mut attempts)
                .await
            {
                Ok(response) => {
                    return Ok(self
                        .succeed(request, target, response, correlation_id, started, deadline, attempts)
                        .await);
                }
                Err(error) => {
                    failures.push(CandidateFailure::error(target, &error));

                    if error.kind == ErrorKind::DeadlineExceeded {
                        warn!(
                            correlation_id = %correlation_id,
                            provider = %target.provider,
                            "Deadline reached while waiting for provider"
                        );
                        return Err(GatewayError::deadline_exceeded(failures));
                    }

                    if error.kind.is_terminal() {
                        warn!(
                            correlation_id = %correlation_id,
                            provider = %target.provider,
                            model = %target.model,
                            kind = %error.kind,
                            "Request-level failure, not trying further candidates"
                        );
                        return Err(GatewayError::terminal(&error, failures));
                    }

                    if error.kind.excludes_provider() {
                        excluded.insert(target.provider.clone(), error.kind);
                    }
                }
            }
        }

        warn!(
            correlation_id = %correlation_id,
            candidates = candidates.len(),
            "All candidates exhausted"
        );
        Err(GatewayError::exhausted(failures))
    }

    /// Absolute deadline for this call on the tokio clock
    fn deadline_for(&self, request: &LlmRequest, started: Instant) -> Result<Instant, GatewayError> {
        match request.deadline {
            Some(at) => {
                let remaining = (at - Utc::now())
                    .to_std()
                    .map_err(|_| GatewayError::deadline_exceeded(Vec::new()))?;

                if remaining.is_zero() {
                    return Err(GatewayError::deadline_exceeded(Vec::new()));
                }

                Ok(started + remaining)
            }
            None => Ok(started + self.config.default_deadline()),
        }
    }

    /// Call one candidate, retrying `UpstreamUnavailable` with backoff
    async fn attempt(
        &self,
        provider: &dyn LlmProvider,
        target: &ProviderTarget,
        request: &LlmRequest,
        deadline: Instant,
        mut admission: Admission,
        attempts: &mut u32,
    ) -> Result<LlmResponse, ProviderError> {
        let retry = &self.config.retry;
        let mut retries = 0u32;

        loop {
            let now = Instant::now();

            if now >= deadline {
                return Err(ProviderError::deadline_exceeded(&target.provider));
            }

            let attempt_deadline = match self.config.attempt_timeout() {
                Some(timeout) => (now + timeout).min(deadline),
                None => deadline,
            };

            *attempts += 1;
            let result = invoke(provider, &target.model, request, attempt_deadline).await;
            let latency = now.elapsed();

            let result = match result {
                Err(e) if e.kind == ErrorKind::Timeout && Instant::now() >= deadline => Err(
                    ProviderError::new(ErrorKind::DeadlineExceeded, &target.provider, e.message),
                ),
                other => other,
            };

            let outcome = match &result {
                Ok(_) => CallOutcome::Success,
                Err(e) => CallOutcome::from_error_kind(e.kind),
            };
            self.health
                .record_outcome(&target.provider, admission, outcome, latency);

            let usage = result.as_ref().ok().map(|r| r.usage);
            record_llm_request(LlmRequestMetricParams {
                provider: &target.provider,
                model: &target.model,
                duration: latency,
                success: result.is_ok(),
                input_tokens: usage.map(|u| u.prompt_tokens as u64),
                output_tokens: usage.map(|u| u.completion_tokens as u64),
                cost_micros: usage.map(|u| {
                    self.pricing
                        .cost_micros(&target.provider, &target.model, &u)
                        .max(0) as u64
                }),
            });

            let error = match result {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if error.kind != ErrorKind::UpstreamUnavailable || retries >= retry.max_retries {
                return Err(error);
            }

            let delay = retry.delay_for_attempt(retries);
            retries += 1;

            debug!(
                provider = %target.provider,
                model = %target.model,
                retry = retries,
                delay_ms = delay.as_millis() as u64,
                "Retrying unavailable candidate"
            );
            tokio::time::sleep_until((Instant::now() + delay).min(deadline)).await;

            admission = self.health.try_acquire(&target.provider);
            if !admission.is_admitted() {
                return Err(error);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn succeed(
        &self,
        request: &LlmRequest,
        target: &ProviderTarget,
        response: LlmResponse,
        correlation_id: &str,
        started: Instant,
        deadline: Instant,
        attempts: u32,
    ) -> InvocationResult {
        let cost_usd = self
            .pricing
            .cost_usd(&target.provider, &target.model, &response.usage);
        let latency_ms = started.elapsed().as_millis() as u64;

        info!(
            correlation_id = %correlation_id,
            provider = %target.provider,
            model = %target.model,
            latency_ms,
            cost_usd,
            attempts,
            "Request served"
        );

        if let Some(cache) = &self.cache {
            let cached = CachedResponse {
                content: response.content.clone(),
                usage: response.usage,
                provider: target.provider.clone(),
                model: target.model.clone(),
            };

            if tokio::time::timeout_at(deadline, cache.store(request, cached))
                .await
                .is_err()
            {
                warn!(correlation_id = %correlation_id, "Deadline reached while caching response");
            }
        }

        InvocationResult {
            content: response.content,
            usage: response.usage,
            cost_usd,
            latency_ms,
            provider_used: target.provider.clone(),
            model_used: target.model.clone(),
            cache_hit: false,
            correlation_id: correlation_id.to_string(),
            cache_similarity: None,
            attempts,
        }
    }
}

fn cached_result(hit: CacheHit, correlation_id: &str, started: Instant) -> InvocationResult {
    let response = hit.entry.response;

    debug!(
        correlation_id = %correlation_id,
        provider = %response.provider,
        similarity = hit.similarity,
        "Served from semantic cache"
    );

    InvocationResult {
        content: response.content,
        usage: Usage::default(),
        cost_usd: 0.0,
        latency_ms: started.elapsed().as_millis() as u64,
        provider_used: response.provider,
        model_used: response.model,
        cache_hit: true,
        correlation_id: correlation_id.to_string(),
        cache_similarity: Some(hit.similarity),
        attempts: 0,
    }
}

fn validate_routing(routing: &RoutingConfig, providers: &ProviderRegistry) -> Result<(), RoutingError> {
    routing.validate()?;

    match routing
        .provider_ids()
        .into_iter()
        .find(|id| !providers.contains(id))
    {
        Some(unknown) => Err(RoutingError::InvalidTarget(format!(
            "unknown provider '{}'",
            unknown
        ))),
        None => Ok(()),
    }
}
