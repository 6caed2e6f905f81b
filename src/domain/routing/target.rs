use std::fmt;

use serde::{Deserialize, Serialize};

/// A (provider, model) pair considered for handling a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderTarget {
    pub provider: String,
    pub model: String,
}

impl ProviderTarget {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for ProviderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Ordered alternates tried after the rule-matched target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackChain(Vec<ProviderTarget>);

impl FallbackChain {
    pub fn new(targets: Vec<ProviderTarget>) -> Self {
        Self(targets)
    }

    pub fn targets(&self) -> &[ProviderTarget] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ProviderTarget>> for FallbackChain {
    fn from(targets: Vec<ProviderTarget>) -> Self {
        Self(targets)
    }
}
