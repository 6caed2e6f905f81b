use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Message, MessageRole};

/// Tenant used when a request does not carry one
pub const DEFAULT_TENANT: &str = "default";

/// A model invocation request as submitted by callers
///
/// Treated as an immutable value once built: the gateway only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    /// Task-class hint such as `complex-reasoning` or `simple-qa`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_class: Option<String>,
    /// Explicitly requested model identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Caller-supplied idempotency/correlation id
    #[serde(default = "new_correlation_id")]
    pub correlation_id: String,
    /// Cache partition owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Absolute time after which the request must fail rather than keep trying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

impl LlmRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            task_class: None,
            model: None,
            temperature: None,
            max_tokens: None,
            correlation_id: new_correlation_id(),
            tenant_id: None,
            deadline: None,
        }
    }

    pub fn builder() -> LlmRequestBuilder {
        LlmRequestBuilder::new()
    }

    pub fn tenant(&self) -> &str {
        self.tenant_id.as_deref().unwrap_or(DEFAULT_TENANT)
    }

    /// Total number of characters across all message contents
    pub fn message_length(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    /// Role-tagged transcript used for embedding and digesting
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builder for LlmRequest
#[derive(Debug, Default)]
pub struct LlmRequestBuilder {
    messages: Vec<Message>,
    task_class: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    correlation_id: Option<String>,
    tenant_id: Option<String>,
    deadline: Option<DateTime<Utc>>,
}

impl LlmRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn system(self, content: impl Into<String>) -> Self {
        self.message(Message::system(content))
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.message(Message::user(content))
    }

    pub fn assistant(self, content: impl Into<String>) -> Self {
        self.message(Message::assistant(content))
    }

    pub fn task_class(mut self, task_class: impl Into<String>) -> Self {
        self.task_class = Some(task_class.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn build(self) -> LlmRequest {
        LlmRequest {
            messages: self.messages,
            task_class: self.task_class,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            correlation_id: self.correlation_id.unwrap_or_else(new_correlation_id),
            tenant_id: self.tenant_id,
            deadline: self.deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::builder()
            .system("You are a helpful assistant")
            .user("Hello!")
            .task_class("simple-qa")
            .temperature(0.7)
            .max_tokens(100)
            .build();

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.task_class.as_deref(), Some("simple-qa"));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(100));
        assert!(!request.correlation_id.is_empty());
        assert_eq!(request.tenant(), DEFAULT_TENANT);
    }

    #[test]
    fn test_message_length_counts_all_messages() {
        let request = LlmRequest::builder().system("abc").user("héllo").build();
        assert_eq!(request.message_length(), 8);
    }

    #[test]
    fn test_last_user_message() {
        let request = LlmRequest::builder()
            .user("first")
            .assistant("reply")
            .user("second")
            .build();

        assert_eq!(request.last_user_message(), Some("second"));
    }

    #[test]
    fn test_deserialize_minimal_request() {
        let request: LlmRequest = serde_json::from_value(serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();

        assert_eq!(request.messages.len(), 1);
        assert!(request.deadline.is_none());
        assert!(!request.correlation_id.is_empty());
    }

    #[test]
    fn test_transcript_is_role_tagged() {
        let request = LlmRequest::builder().system("be brief").user("hi").build();
        assert_eq!(request.transcript(), "system: be brief\nuser: hi");
    }
}
