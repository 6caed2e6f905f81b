//! Gateway call policy and outcomes

mod config;
mod error;
mod result;

pub use config::{GatewayConfig, RetryConfig};
pub use error::{CandidateFailure, FailureReason, GatewayError};
pub use result::InvocationResult;
