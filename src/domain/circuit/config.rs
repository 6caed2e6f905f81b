//! Circuit breaker configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Thresholds and timings for per-provider circuit breakers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure rate above which a closed circuit opens (0.0 to 1.0)
    #[serde(default = "default_failure_rate_threshold")]
    pub failure_rate_threshold: f64,

    /// Maximum number of recent outcomes kept in the window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Maximum age of outcomes kept in the window
    #[serde(default = "default_window_duration_secs")]
    pub window_duration_secs: u64,

    /// Outcomes required in the window before the failure rate is evaluated.
    ///
    /// With the default of 1 a closed circuit opens as soon as the window's
    /// failure rate crosses the threshold. Raise it to tolerate isolated failures.
    #[serde(default = "default_minimum_samples")]
    pub minimum_samples: usize,

    /// Time an open circuit waits before admitting a trial request
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// A half-open trial that has not reported back after this long is abandoned
    #[serde(default = "default_trial_timeout_secs")]
    pub trial_timeout_secs: u64,
}

fn default_failure_rate_threshold() -> f64 {
    0.5
}

fn default_window_size() -> usize {
    20
}

fn default_window_duration_secs() -> u64 {
    60
}

fn default_minimum_samples() -> usize {
    1
}

fn default_cooldown_secs() -> u64 {
    30
}

fn default_trial_timeout_secs() -> u64 {
    30
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: default_failure_rate_threshold(),
            window_size: default_window_size(),
            window_duration_secs: default_window_duration_secs(),
            minimum_samples: default_minimum_samples(),
            cooldown_secs: default_cooldown_secs(),
            trial_timeout_secs: default_trial_timeout_secs(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_duration_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn trial_timeout(&self) -> Duration {
        Duration::from_secs(self.trial_timeout_secs)
    }

    pub fn with_failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.failure_rate_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }

    pub fn with_window_duration(mut self, duration: Duration) -> Self {
        self.window_duration_secs = duration.as_secs();
        self
    }

    pub fn with_minimum_samples(mut self, samples: usize) -> Self {
        self.minimum_samples = samples;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown_secs = cooldown.as_secs();
        self
    }

    pub fn with_trial_timeout(mut self, timeout: Duration) -> Self {
        self.trial_timeout_secs = timeout.as_secs();
        self
    }
}
