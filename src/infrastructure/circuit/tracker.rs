//! Per-provider health tracking
//!
//! One [`CircuitBreaker`] per provider id, each behind its own mutex so that
//! providers never contend with each other. Locks are held only for the state
//! update, never across an await.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::info;

use crate::domain::circuit::{
    Admission, CallOutcome, CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState,
    CircuitTransition,
};
use crate::infrastructure::observability::record_circuit_transition;

/// Tracks circuit state for every provider the gateway has called
#[derive(Debug)]
pub struct HealthTracker {
    config: CircuitBreakerConfig,
    circuits: DashMap<String, Arc<Mutex<CircuitBreaker>>>,
}

impl HealthTracker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            circuits: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn circuit(&self, provider: &str) -> Arc<Mutex<CircuitBreaker>> {
        if let Some(existing) = self.circuits.get(provider) {
            return Arc::clone(existing.value());
        }

        let entry = self
            .circuits
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CircuitBreaker::new(self.config.clone()))));

        Arc::clone(entry.value())
    }

    /// Whether `provider` would currently accept a call. Unknown providers are closed.
    pub fn is_available(&self, provider: &str) -> bool {
        match self.circuits.get(provider) {
            Some(circuit) => circuit
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_available(Instant::now()),
            None => true,
        }
    }

    /// Claim admission for one call. A [`Admission::Trial`] holder must report back
    /// through [`record_outcome`](Self::record_outcome).
    pub fn try_acquire(&self, provider: &str) -> Admission {
        let circuit = self.circuit(provider);
        let (admission, transition) = circuit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_acquire(Instant::now());

        if let Some(transition) = transition {
            log_transition(provider, transition);
        }

        admission
    }

    /// Feed back the outcome of a call admitted with `admission`
    pub fn record_outcome(
        &self,
        provider: &str,
        admission: Admission,
        outcome: CallOutcome,
        latency: Duration,
    ) {
        let circuit = self.circuit(provider);
        let transition = {
            let mut breaker = circuit.lock().unwrap_or_else(PoisonError::into_inner);

            // Only the trial holder may decide a half-open circuit
            if breaker.state() == CircuitState::HalfOpen && admission != Admission::Trial {
                None
            } else {
                breaker.record(outcome, latency, Instant::now())
            }
        };

        if let Some(transition) = transition {
            log_transition(provider, transition);
        }
    }

    pub fn state(&self, provider: &str) -> CircuitState {
        self.circuits
            .get(provider)
            .map(|circuit| circuit.lock().unwrap_or_else(PoisonError::into_inner).state())
            .unwrap_or(CircuitState::Closed)
    }

    pub fn snapshot(&self, provider: &str) -> CircuitSnapshot {
        self.circuit(provider)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot(provider, Instant::now())
    }

    /// Snapshots for every provider seen so far plus `known`, sorted by provider id
    pub fn snapshots<'a>(&self, known: impl IntoIterator<Item = &'a str>) -> Vec<CircuitSnapshot> {
        let mut providers: Vec<String> = self.circuits.iter().map(|e| e.key().clone()).collect();
        providers.extend(known.into_iter().map(str::to_string));
        providers.sort();
        providers.dedup();

        providers.iter().map(|p| self.snapshot(p)).collect()
    }

    /// Force `provider`'s circuit closed. Returns the state it was in.
    pub fn reset(&self, provider: &str) -> CircuitState {
        let circuit = self.circuit(provider);
        let (previous, transition) = {
            let mut breaker = circuit.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = breaker.state();
            (previous, breaker.reset())
        };

        if let Some(transition) = transition {
            log_transition(provider, transition);
        }

        previous
    }
}

fn log_transition(provider: &str, transition: CircuitTransition) {
    info!(
        provider = %provider,
        from = %transition.from,
        to = %transition.to,
        "Circuit state changed"
    );
    record_circuit_transition(provider, transition.to.as_str());
}
