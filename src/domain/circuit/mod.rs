//! Per-provider circuit breaker domain

mod breaker;
mod config;

pub use breaker::{
    Admission, CallOutcome, CircuitBreaker, CircuitSnapshot, CircuitState, CircuitTransition,
};
pub use config::CircuitBreakerConfig;
