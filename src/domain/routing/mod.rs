//! Routing policy: rules, fallback chain and candidate resolution

mod classifier;
mod config;
mod error;
mod predicate;
mod resolver;
mod rule;
mod target;

pub use classifier::{GENERAL_TASK, TaskClassifier};
pub use config::RoutingConfig;
pub use error::RoutingError;
pub use predicate::{Predicate, RequestAttributes};
pub use resolver::{RoutingEngine, request_attributes, resolve};
pub use rule::{RoutingRule, RuleSet};
pub use target::{FallbackChain, ProviderTarget};
