//! Rolling-window circuit breaker state machine
//!
//! Time is passed in explicitly so the machine stays deterministic; the tracker in
//! the infrastructure layer supplies the clock and the locking.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::CircuitBreakerConfig;
use crate::domain::llm::ErrorKind;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a completed call counts towards provider health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
    /// Bad credentials: opens the circuit regardless of the failure rate
    AuthFailure,
    /// Says nothing about provider health; only releases a half-open trial
    Neutral,
}

impl CallOutcome {
    /// Classify a provider error kind
    pub fn from_error_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::AuthError => Self::AuthFailure,
            ErrorKind::InvalidRequest | ErrorKind::DeadlineExceeded => Self::Neutral,
            ErrorKind::RateLimited
            | ErrorKind::Timeout
            | ErrorKind::UpstreamUnavailable
            | ErrorKind::AllProvidersExhausted => Self::Failure,
        }
    }
}

/// Result of asking a breaker to let a call through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The caller holds the single half-open trial and must report its outcome
    Trial,
    Rejected,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// A state change produced by the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitTransition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Point-in-time view of one provider's circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub provider: String,
    pub state: CircuitState,
    pub samples: usize,
    pub failures: usize,
    pub failure_rate: f64,
    pub avg_latency_ms: Option<u64>,
    pub trial_in_flight: bool,
    pub last_transition: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    failed: bool,
    latency: Duration,
}

/// Circuit breaker for a single provider
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    window: VecDeque<Sample>,
    opened_at: Option<Instant>,
    trial_started_at: Option<Instant>,
    last_transition: DateTime<Utc>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            window: VecDeque::new(),
            opened_at: None,
            trial_started_at: None,
            last_transition: Utc::now(),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Whether a call would currently be admitted, without claiming the trial
    pub fn is_available(&self, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => self.cooldown_elapsed(now),
            CircuitState::HalfOpen => !self.trial_in_flight(now),
        }
    }

    /// Admit a call, claiming the half-open trial when one is due
    pub fn try_acquire(&mut self, now: Instant) -> (Admission, Option<CircuitTransition>) {
        match self.state {
            CircuitState::Closed => (Admission::Allowed, None),
            CircuitState::Open if self.cooldown_elapsed(now) => {
                let transition = self.transition(CircuitState::HalfOpen);
                self.trial_started_at = Some(now);
                (Admission::Trial, transition)
            }
            CircuitState::Open => (Admission::Rejected, None),
            CircuitState::HalfOpen if self.trial_in_flight(now) => (Admission::Rejected, None),
            CircuitState::HalfOpen => {
                self.trial_started_at = Some(now);
                (Admission::Trial, None)
            }
        }
    }

    /// Feed back the outcome of an admitted call
    pub fn record(
        &mut self,
        outcome: CallOutcome,
        latency: Duration,
        now: Instant,
    ) -> Option<CircuitTransition> {
        match self.state {
            CircuitState::HalfOpen => {
                self.trial_started_at = None;
                match outcome {
                    CallOutcome::Success => {
                        self.window.clear();
                        self.push(now, false, latency);
                        self.transition(CircuitState::Closed)
                    }
                    CallOutcome::Failure | CallOutcome::AuthFailure => self.open(now),
                    CallOutcome::Neutral => None,
                }
            }
            // Late results from calls admitted before the circuit opened
            CircuitState::Open => None,
            CircuitState::Closed => match outcome {
                CallOutcome::Neutral => None,
                CallOutcome::AuthFailure => {
                    self.push(now, true, latency);
                    self.open(now)
                }
                CallOutcome::Success | CallOutcome::Failure => {
                    self.push(now, outcome == CallOutcome::Failure, latency);
                    self.prune(now);

                    if self.window.len() >= self.config.minimum_samples.max(1)
                        && self.failure_rate() > self.config.failure_rate_threshold
                    {
                        self.open(now)
                    } else {
                        None
                    }
                }
            },
        }
    }

    /// Force the circuit closed and forget the window
    pub fn reset(&mut self) -> Option<CircuitTransition> {
        self.window.clear();
        self.opened_at = None;
        self.trial_started_at = None;
        self.transition(CircuitState::Closed)
    }

    pub fn snapshot(&self, provider: &str, now: Instant) -> CircuitSnapshot {
        let live: Vec<&Sample> = self.live_samples(now).collect();
        let failures = live.iter().filter(|s| s.failed).count();
        let failure_rate = if live.is_empty() {
            0.0
        } else {
            failures as f64 / live.len() as f64
        };
        let avg_latency_ms = (!live.is_empty()).then(|| {
            let total: u128 = live.iter().map(|s| s.latency.as_millis()).sum();
            (total / live.len() as u128) as u64
        });

        CircuitSnapshot {
            provider: provider.to_string(),
            state: self.state,
            samples: live.len(),
            failures,
            failure_rate,
            avg_latency_ms,
            trial_in_flight: self.state == CircuitState::HalfOpen && self.trial_in_flight(now),
            last_transition: self.last_transition,
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.opened_at
            .is_none_or(|opened| now.saturating_duration_since(opened) >= self.config.cooldown())
    }

    fn trial_in_flight(&self, now: Instant) -> bool {
        self.trial_started_at.is_some_and(|started| {
            now.saturating_duration_since(started) < self.config.trial_timeout()
        })
    }

    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|s| s.failed).count();
        failures as f64 / self.window.len() as f64
    }

    fn push(&mut self, at: Instant, failed: bool, latency: Duration) {
        self.window.push_back(Sample {
            at,
            failed,
            latency,
        });
        while self.window.len() > self.config.window_size.max(1) {
            self.window.pop_front();
        }
    }

    fn prune(&mut self, now: Instant) {
        let max_age = self.config.window_duration();
        while self
            .window
            .front()
            .is_some_and(|s| now.saturating_duration_since(s.at) > max_age)
        {
            self.window.pop_front();
        }
    }

    fn live_samples(&self, now: Instant) -> impl Iterator<Item = &Sample> {
        let max_age = self.config.window_duration();
        self.window
            .iter()
            .filter(move |s| now.saturating_duration_since(s.at) <= max_age)
    }

    fn open(&mut self, now: Instant) -> Option<CircuitTransition> {
        self.opened_at = Some(now);
        self.transition(CircuitState::Open)
    }

    fn transition(&mut self, to: CircuitState) -> Option<CircuitTransition> {
        if self.state == to {
            return None;
        }
        let from = self.state;
        self.state = to;
        self.last_transition = Utc::now();
        Some(CircuitTransition { from, to })
    }
}
