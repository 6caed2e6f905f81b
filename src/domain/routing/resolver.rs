use crate::domain::llm::LlmRequest;

use super::{ProviderTarget, RequestAttributes, RoutingConfig, TaskClassifier};

/// Extract the attributes routing predicates are evaluated against
pub fn request_attributes(request: &LlmRequest, config: &RoutingConfig) -> RequestAttributes {
    let task_class = request.task_class.clone().or_else(|| {
        config.infer_task_class.then(|| {
            let text = request.last_user_message().unwrap_or_default();
            TaskClassifier::new().classify(text).to_string()
        })
    });

    RequestAttributes {
        task_class,
        requested_model: request.model.clone(),
        temperature: request.temperature,
        message_length: request.message_length(),
    }
}

/// Resolve the ordered candidate list for `request`.
///
/// The first enabled rule whose predicate matches gives the primary target. The default
/// rule's target follows when `default_as_fallback` is set, then enabled fallback
/// entries in chain order, with duplicates removed. Pure: the same
/// request and config always produce the same list, and a validated config never
/// produces an empty one.
pub fn resolve(request: &LlmRequest, config: &RoutingConfig) -> Vec<ProviderTarget> {
    let attrs = request_attributes(request, config);

    let primary = config
        .rules
        .rules()
        .iter()
        .find(|rule| !config.is_disabled(&rule.target) && rule.predicate.evaluate(&attrs))
        .map(|rule| rule.target.clone());

    let mut candidates: Vec<ProviderTarget> = primary.into_iter().collect();

    let default_target = config
        .default_as_fallback
        .then(|| &config.rules.default_rule().target);

    for target in default_target.into_iter().chain(config.fallback_chain.targets()) {
        if !config.is_disabled(target) && !candidates.contains(target) {
            candidates.push(target.clone());
        }
    }

    candidates
}

/// Routing entry point bound to one config snapshot
#[derive(Debug, Clone, Copy)]
pub struct RoutingEngine<'a> {
    config: &'a RoutingConfig,
}

impl<'a> RoutingEngine<'a> {
    pub fn new(config: &'a RoutingConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, request: &LlmRequest) -> Vec<ProviderTarget> {
        resolve(request, self.config)
    }

    pub fn attributes(&self, request: &LlmRequest) -> RequestAttributes {
        request_attributes(request, self.config)
    }
}
