//! Circuit breaker tracking

mod tracker;

pub use tracker::HealthTracker;
