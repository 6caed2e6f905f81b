use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::classify::classify_http_error;
use super::http_client::HttpClientTrait;
use crate::domain::llm::{
    ErrorKind, FinishReason, LlmProvider, LlmRequest, LlmResponse, Message, MessageRole,
    ProviderError, Usage,
};

const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const PROVIDER_KIND: &str = "anthropic";

/// Anthropic messages API adapter
#[derive(Debug)]
pub struct AnthropicProvider<C: HttpClientTrait> {
    id: String,
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> AnthropicProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_ANTHROPIC_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            id: PROVIDER_KIND.to_string(),
            client,
            api_key: api_key.into(),
            base_url,
        }
    }

    /// Register under a different provider id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let (system, messages) = split_system_messages(&request.messages);

        let anthropic_messages: Vec<AnthropicMessage> =
            messages.into_iter().map(AnthropicMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": anthropic_messages,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });

        if let Some(system_content) = system {
            body["system"] = serde_json::json!(system_content);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, ProviderError> {
        let response: AnthropicResponse = serde_json::from_value(json).map_err(|e| {
            ProviderError::unavailable(&self.id, format!("Failed to parse response: {}", e))
        })?;

        let content = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(LlmResponse::new(response.id, response.model, content)
            .with_finish_reason(parse_stop_reason(response.stop_reason.as_deref()))
            .with_usage(Usage::new(
                response.usage.input_tokens,
                response.usage.output_tokens,
            )))
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for AnthropicProvider<C> {
    async fn chat(
        &self,
        model: &str,
        request: &LlmRequest,
        timeout: Duration,
    ) -> Result<LlmResponse, ProviderError> {
        let url = self.messages_url();
        let body = self.build_request(model, request);
        let response = self
            .client
            .post_json(&url, self.headers(), &body, timeout)
            .await
            .map_err(|e| classify_http_error(&self.id, e, error_type_kind))?;

        self.parse_response(response)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

/// Anthropic `error.type` values that outrank the HTTP status
fn error_type_kind(error_type: &str) -> Option<ErrorKind> {
    match error_type {
        "authentication_error" | "permission_error" => Some(ErrorKind::AuthError),
        "rate_limit_error" => Some(ErrorKind::RateLimited),
        "overloaded_error" | "api_error" => Some(ErrorKind::UpstreamUnavailable),
        "invalid_request_error" | "not_found_error" | "request_too_large" => {
            Some(ErrorKind::InvalidRequest)
        }
        _ => None,
    }
}

/// System messages go in the top-level `system` field, joined by newlines
fn split_system_messages(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let mut system_content = String::new();
    let mut other_messages = Vec::new();

    for msg in messages {
        if msg.role == MessageRole::System {
            if !system_content.is_empty() {
                system_content.push('\n');
            }
            system_content.push_str(msg.content_text());
        } else {
            other_messages.push(msg);
        }
    }

    let system = (!system_content.is_empty()).then_some(system_content);

    (system, other_messages)
}

fn parse_stop_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
        Some("max_tokens") => FinishReason::Length,
        Some("tool_use") => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> AnthropicMessage<'a> {
    fn from_domain(message: &'a Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content_text(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::infrastructure::llm::HttpClient;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "https://api.anthropic.com/v1/messages";
    const TIMEOUT: Duration = Duration::from_secs(5);

    fn message_response() -> serde_json::Value {
        serde_json::json!({
            "id": "msg_123",
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                {"type": "text", "text": "Hello"},
                {"type": "text", "text": " there"}
            ],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 12, "output_tokens": 4}
        })
    }

    #[tokio::test]
    async fn test_anthropic_chat() {
        let client = MockHttpClient::new().with_response(TEST_URL, message_response());
        let provider = AnthropicProvider::new(client, "test-key");
        let request = LlmRequest::builder()
            .system("You are terse")
            .system("Answer in English")
            .user("Hi")
            .build();

        let response = provider
            .chat("claude-3-5-sonnet-20241022", &request, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(response.content, "Hello there");
        assert_eq!(response.finish_reason, Some(FinishReason::Length));
        assert_eq!(response.usage, Usage::new(12, 4));

        let body = provider.client.last_body().unwrap();
        assert_eq!(body["system"], "You are terse\nAnswer in English");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(
            provider.client.last_header("anthropic-version").as_deref(),
            Some(ANTHROPIC_VERSION)
        );
    }

    async fn status_kind(status: u16, body: serde_json::Value) -> ErrorKind {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "k"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::with_base_url(HttpClient::new(), "k", server.uri())
            .with_id("claude");
        let error = provider
            .chat("claude-3-5-haiku-20241022", &LlmRequest::builder().user("x").build(), TIMEOUT)
            .await
            .unwrap_err();

        assert_eq!(error.provider, "claude");
        error.kind
    }

    fn typed_error(error_type: &str) -> serde_json::Value {
        serde_json::json!({
            "type": "error",
            "error": {"type": error_type, "message": "details"}
        })
    }

    #[tokio::test]
    async fn test_error_type_classification() {
        assert_eq!(
            status_kind(529, typed_error("overloaded_error")).await,
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(
            status_kind(401, typed_error("authentication_error")).await,
            ErrorKind::AuthError
        );
        assert_eq!(
            status_kind(403, typed_error("permission_error")).await,
            ErrorKind::AuthError
        );
        assert_eq!(
            status_kind(429, typed_error("rate_limit_error")).await,
            ErrorKind::RateLimited
        );
        assert_eq!(
            status_kind(400, typed_error("invalid_request_error")).await,
            ErrorKind::InvalidRequest
        );
    }

    #[tokio::test]
    async fn test_unrecognised_body_falls_back_to_status() {
        assert_eq!(
            status_kind(502, serde_json::json!({"oops": true})).await,
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(
            status_kind(408, serde_json::json!({})).await,
            ErrorKind::Timeout
        );
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(message_response())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let provider = AnthropicProvider::with_base_url(HttpClient::new(), "k", server.uri());
        let error = provider
            .chat(
                "claude-3-5-haiku-20241022",
                &LlmRequest::builder().user("x").build(),
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Timeout);
    }
}
