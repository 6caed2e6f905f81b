use serde::{Deserialize, Serialize};

use super::{Predicate, ProviderTarget, RoutingError};

/// Predicate paired with the target it routes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    #[serde(default)]
    pub name: String,
    pub predicate: Predicate,
    pub target: ProviderTarget,
}

impl RoutingRule {
    pub fn new(name: impl Into<String>, predicate: Predicate, target: ProviderTarget) -> Self {
        Self {
            name: name.into(),
            predicate,
            target,
        }
    }

    /// Catch-all rule matching every request
    pub fn default_rule(target: ProviderTarget) -> Self {
        Self::new("default", Predicate::Always, target)
    }
}

/// Ordered rules, evaluated first-match-wins.
///
/// Always ends with a rule whose predicate is [`Predicate::Always`], so every request
/// matches at least one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RoutingRule>", into = "Vec<RoutingRule>")]
pub struct RuleSet {
    rules: Vec<RoutingRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RoutingRule>) -> Result<Self, RoutingError> {
        let last = rules.last().ok_or(RoutingError::EmptyRuleSet)?;

        if !last.predicate.is_always() {
            return Err(RoutingError::MissingDefaultRule(last.name.clone()));
        }

        for rule in &rules {
            if rule.target.provider.is_empty() || rule.target.model.is_empty() {
                return Err(RoutingError::InvalidTarget(format!(
                    "rule '{}' has an empty provider or model",
                    rule.name
                )));
            }
        }

        Ok(Self { rules })
    }

    /// Build from conditional rules plus a terminal default target
    pub fn with_default(mut rules: Vec<RoutingRule>, default_target: ProviderTarget) -> Self {
        rules.push(RoutingRule::default_rule(default_target));
        Self { rules }
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub fn default_rule(&self) -> &RoutingRule {
        // Non-empty by construction
        &self.rules[self.rules.len() - 1]
    }
}

impl TryFrom<Vec<RoutingRule>> for RuleSet {
    type Error = RoutingError;

    fn try_from(rules: Vec<RoutingRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<RuleSet> for Vec<RoutingRule> {
    fn from(rule_set: RuleSet) -> Self {
        rule_set.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_set_requires_terminal_default() {
        let rules = vec![RoutingRule::new(
            "code",
            Predicate::task_class("code"),
            ProviderTarget::new("a", "x"),
        )];

        assert_eq!(
            RuleSet::new(rules).unwrap_err(),
            RoutingError::MissingDefaultRule("code".to_string())
        );
        assert_eq!(RuleSet::new(vec![]).unwrap_err(), RoutingError::EmptyRuleSet);
    }

    #[test]
    fn test_rule_set_rejects_empty_target() {
        let rules = vec![RoutingRule::default_rule(ProviderTarget::new("a", ""))];
        assert!(matches!(
            RuleSet::new(rules),
            Err(RoutingError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_with_default_appends_catch_all() {
        let rule_set = RuleSet::with_default(vec![], ProviderTarget::new("b", "y"));
        assert_eq!(rule_set.rules().len(), 1);
        assert!(rule_set.default_rule().predicate.is_always());
    }

    #[test]
    fn test_deserialize_validates() {
        let missing_default: Result<RuleSet, _> = serde_json::from_value(serde_json::json!([
            {"name": "code", "predicate": {"type": "task_class", "equals": "code"},
             "target": {"provider": "a", "model": "x"}}
        ]));
        assert!(missing_default.is_err());

        let valid: RuleSet = serde_json::from_value(serde_json::json!([
            {"predicate": {"type": "always"}, "target": {"provider": "b", "model": "y"}}
        ]))
        .unwrap();
        assert_eq!(valid.default_rule().target, ProviderTarget::new("b", "y"));
    }
}
