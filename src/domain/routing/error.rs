use thiserror::Error;

use super::ProviderTarget;

/// Reasons a routing configuration is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("rule set must not be empty")]
    EmptyRuleSet,

    #[error("last rule '{0}' must use the 'always' predicate")]
    MissingDefaultRule(String),

    #[error("default target {0} is disabled")]
    DisabledDefaultTarget(ProviderTarget),

    #[error("invalid target: {0}")]
    InvalidTarget(String),
}
