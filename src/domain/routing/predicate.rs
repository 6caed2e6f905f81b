//! Boolean expressions over request attributes

use serde::{Deserialize, Serialize};

/// Request attributes visible to routing predicates
#[derive(Debug, Clone, PartialEq)]
pub struct RequestAttributes {
    /// Explicit task-class hint, or the inferred one when the request had none
    pub task_class: Option<String>,
    pub requested_model: Option<String>,
    pub temperature: Option<f32>,
    /// Total characters across all messages
    pub message_length: usize,
}

/// Routing predicate
///
/// A request without a temperature never satisfies a `temperature` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    Always,
    TaskClass {
        equals: String,
    },
    TaskClassIn {
        values: Vec<String>,
    },
    RequestedModel {
        equals: String,
    },
    Temperature {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f32>,
    },
    MessageLength {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    All {
        predicates: Vec<Predicate>,
    },
    Any {
        predicates: Vec<Predicate>,
    },
    Not {
        predicate: Box<Predicate>,
    },
}

impl Predicate {
    pub fn task_class(value: impl Into<String>) -> Self {
        Self::TaskClass {
            equals: value.into(),
        }
    }

    pub fn requested_model(value: impl Into<String>) -> Self {
        Self::RequestedModel {
            equals: value.into(),
        }
    }

    pub fn temperature(min: Option<f32>, max: Option<f32>) -> Self {
        Self::Temperature { min, max }
    }

    pub fn message_length(min: Option<usize>, max: Option<usize>) -> Self {
        Self::MessageLength { min, max }
    }

    pub fn all(predicates: Vec<Predicate>) -> Self {
        Self::All { predicates }
    }

    pub fn any(predicates: Vec<Predicate>) -> Self {
        Self::Any { predicates }
    }

    pub fn negate(predicate: Predicate) -> Self {
        Self::Not {
            predicate: Box::new(predicate),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Self::Always)
    }

    pub fn evaluate(&self, attrs: &RequestAttributes) -> bool {
        match self {
            Self::Always => true,
            Self::TaskClass { equals } => attrs.task_class.as_deref() == Some(equals.as_str()),
            Self::TaskClassIn { values } => attrs
                .task_class
                .as_ref()
                .is_some_and(|task| values.iter().any(|v| v == task)),
            Self::RequestedModel { equals } => {
                attrs.requested_model.as_deref() == Some(equals.as_str())
            }
            Self::Temperature { min, max } => attrs.temperature.is_some_and(|temp| {
                min.is_none_or(|lo| temp >= lo) && max.is_none_or(|hi| temp <= hi)
            }),
            Self::MessageLength { min, max } => {
                let len = attrs.message_length;
                min.is_none_or(|lo| len >= lo) && max.is_none_or(|hi| len <= hi)
            }
            Self::All { predicates } => predicates.iter().all(|p| p.evaluate(attrs)),
            Self::Any { predicates } => predicates.iter().any(|p| p.evaluate(attrs)),
            Self::Not { predicate } => !predicate.evaluate(attrs),
        }
    }
}
