use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::classify::classify_http_error;
use super::http_client::HttpClientTrait;
use crate::domain::llm::{
    ErrorKind, FinishReason, LlmProvider, LlmRequest, LlmResponse, Message, ProviderError, Usage,
};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const PROVIDER_KIND: &str = "openai";

/// OpenAI chat completions adapter
#[derive(Debug)]
pub struct OpenAiProvider<C: HttpClientTrait> {
    id: String,
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            id: PROVIDER_KIND.to_string(),
            client,
            auth_header,
            base_url,
        }
    }

    /// Register under a different provider id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<OpenAiMessage> =
            request.messages.iter().map(OpenAiMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, ProviderError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            ProviderError::unavailable(&self.id, format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::unavailable(&self.id, "No choices in response"))?;

        let mut llm_response = LlmResponse::new(
            response.id,
            response.model,
            choice.message.content.unwrap_or_default(),
        );

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(&reason));
        }

        if let Some(usage) = response.usage {
            llm_response = llm_response
                .with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenAiProvider<C> {
    async fn chat(
        &self,
        model: &str,
        request: &LlmRequest,
        timeout: Duration,
    ) -> Result<LlmResponse, ProviderError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, request);
        let response = self
            .client
            .post_json(&url, self.headers(), &body, timeout)
            .await
            .map_err(|e| classify_http_error(&self.id, e, error_code_kind))?;

        self.parse_response(response)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

/// OpenAI `error.type` / `error.code` values that outrank the HTTP status
fn error_code_kind(code: &str) -> Option<ErrorKind> {
    match code {
        "insufficient_quota" | "rate_limit_exceeded" => Some(ErrorKind::RateLimited),
        "invalid_api_key" | "invalid_organization" => Some(ErrorKind::AuthError),
        "context_length_exceeded" => Some(ErrorKind::InvalidRequest),
        "server_error" => Some(ErrorKind::UpstreamUnavailable),
        _ => None,
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> OpenAiMessage<'a> {
    fn from_domain(message: &'a Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content_text(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: String,
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
