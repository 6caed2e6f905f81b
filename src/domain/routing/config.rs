use serde::{Deserialize, Serialize};

use super::{FallbackChain, ProviderTarget, RoutingError, RuleSet};

/// Immutable routing snapshot: rules, fallback chain and disabled targets.
///
/// Updates replace the whole value; nothing mutates a published config in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub rules: RuleSet,
    #[serde(default)]
    pub fallback_chain: FallbackChain,
    /// Targets never produced by resolution
    #[serde(default)]
    pub disabled_targets: Vec<ProviderTarget>,
    /// Infer a task class from message text when the request has none
    #[serde(default = "default_true")]
    pub infer_task_class: bool,
    /// Try the default rule's target right after a more specific match.
    ///
    /// On by default, so a rule-matched request with an empty fallback chain
    /// resolves to `[primary, default]`. Set to `false` when a matched rule's
    /// target plus the fallback chain must be the whole candidate list.
    #[serde(default = "default_true")]
    pub default_as_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl RoutingConfig {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            fallback_chain: FallbackChain::default(),
            disabled_targets: Vec::new(),
            infer_task_class: true,
            default_as_fallback: true,
        }
    }

    pub fn with_fallback_chain(mut self, chain: impl Into<FallbackChain>) -> Self {
        self.fallback_chain = chain.into();
        self
    }

    pub fn with_disabled_targets(mut self, targets: Vec<ProviderTarget>) -> Self {
        self.disabled_targets = targets;
        self
    }

    pub fn with_task_inference(mut self, enabled: bool) -> Self {
        self.infer_task_class = enabled;
        self
    }

    pub fn with_default_as_fallback(mut self, enabled: bool) -> Self {
        self.default_as_fallback = enabled;
        self
    }

    pub fn is_disabled(&self, target: &ProviderTarget) -> bool {
        self.disabled_targets.contains(target)
    }

    /// Reject configs that could resolve to an empty candidate list
    pub fn validate(&self) -> Result<(), RoutingError> {
        let default_target = &self.rules.default_rule().target;

        if self.is_disabled(default_target) {
            return Err(RoutingError::DisabledDefaultTarget(default_target.clone()));
        }

        if let Some(bad) = self
            .fallback_chain
            .targets()
            .iter()
            .find(|t| t.provider.is_empty() || t.model.is_empty())
        {
            return Err(RoutingError::InvalidTarget(format!(
                "fallback entry '{}' has an empty provider or model",
                bad
            )));
        }

        Ok(())
    }

    /// Every provider id this config can route to
    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        let targets = self
            .rules
            .rules()
            .iter()
            .map(|r| &r.target)
            .chain(self.fallback_chain.targets());

        for target in targets {
            if !ids.contains(&target.provider.as_str()) {
                ids.push(&target.provider);
            }
        }
        ids
    }
}
