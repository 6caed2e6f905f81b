use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a raw HTTP exchange, before provider-specific classification
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HttpError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    /// POST a JSON body and decode a JSON response. Non-2xx statuses are returned as
    /// [`HttpError::Status`] with the raw body so callers can classify them.
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value, HttpError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value, HttpError> {
        let mut request = self.client.post(url).timeout(timeout);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.json(body).send().await.map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status { status, body });
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Decode(e.to_string())
            }
        })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Transport(error.to_string())
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use super::*;

    /// Canned responses keyed by URL; records the last body sent
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, Result<serde_json::Value, HttpError>>>,
        last_body: RwLock<Option<serde_json::Value>>,
        last_headers: RwLock<Vec<(String, String)>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.responses
                .write()
                .unwrap()
                .insert(url.into(), Ok(response));
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: HttpError) -> Self {
            self.responses
                .write()
                .unwrap()
                .insert(url.into(), Err(error));
            self
        }

        pub fn last_body(&self) -> Option<serde_json::Value> {
            self.last_body.read().unwrap().clone()
        }

        pub fn last_header(&self, name: &str) -> Option<String> {
            self.last_headers
                .read()
                .unwrap()
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
            _timeout: Duration,
        ) -> Result<serde_json::Value, HttpError> {
            *self.last_body.write().unwrap() = Some(body.clone());
            *self.last_headers.write().unwrap() = headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

            self.responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(HttpError::Transport(format!("no mock response for {}", url))))
        }
    }
}
