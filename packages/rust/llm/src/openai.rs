//! OpenAI-compatible chat-completions client (Groq, OpenRouter, OpenAI, vLLM...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use serde_json::Value;
use tracing::{debug, instrument};

use bidflow_shared::LlmConfig;

use crate::ChatModel;
use crate::error::LlmError;
use crate::retry::RetryPolicy;
use crate::types::{ChatRequest, ChatResponse, Usage};

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("BidFlow/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Build from the `[llm]` config section and a resolved API key.
    pub fn from_llm_config(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: config.base_url.clone(),
            default_model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig, retry: RetryPolicy) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            retry,
        })
    }

    /// Build a provider straight from the `[llm]` config section.
    pub fn from_llm_config(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let retry = RetryPolicy::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        );
        Self::new(OpenAiConfig::from_llm_config(config, api_key), retry)
    }

    fn build_headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| LlmError::InvalidRequest(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_payload(&self, request: &ChatRequest) -> Value {
        let model = if request.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let mut payload = serde_json::json!({
            "model": model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(temp) = request.temperature {
            payload["temperature"] = serde_json::json!(temp);
        }
        if let Some(max_tokens) = request.max_tokens {
            payload["max_tokens"] = serde_json::json!(max_tokens);
        }

        payload
    }

    fn parse_usage(body: &Value) -> Usage {
        let usage = body.get("usage");
        let field = |name: &str| {
            usage
                .and_then(|u| u.get(name))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };
        Usage {
            prompt_tokens: field("prompt_tokens"),
            completion_tokens: field("completion_tokens"),
        }
    }

    fn parse_response(body: &Value) -> Result<ChatResponse, LlmError> {
        let choice = body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .ok_or_else(|| LlmError::MalformedResponse("response has no choices".into()))?;

        let content = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::MalformedResponse("choice has no message content".into()))?
            .to_string();

        let finish_reason = choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(str::to_string);

        let model = body
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        Ok(ChatResponse {
            content,
            model,
            usage: Self::parse_usage(body),
            finish_reason,
        })
    }

    fn map_error(status: u16, body: &str, retry_after: Option<u64>) -> LlmError {
        let message: String = body.chars().take(MAX_ERROR_BODY).collect();
        match status {
            401 | 403 => LlmError::AuthenticationError(message),
            429 => LlmError::RateLimitExceeded { retry_after },
            _ => LlmError::ApiError { status, message },
        }
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let headers = self.build_headers()?;
        let payload = self.build_payload(request);

        let response = self
            .client
            .post(self.endpoint())
            .headers(headers)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let text = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(Self::map_error(status.as_u16(), &text, retry_after));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON body: {e}")))?;
        Self::parse_response(&body)
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl ChatModel for OpenAiProvider {
    fn model_id(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip_all, fields(model = %self.config.default_model, messages = request.messages.len()))]
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self.retry.run(|| self.send_once(&request)).await?;
        debug!(
            tokens_in = response.usage.prompt_tokens,
            tokens_out = response.usage.completion_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "completion received"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(
            OpenAiConfig {
                api_key: "test-key".into(),
                base_url: "https://api.groq.com/openai/v1/".into(),
                default_model: "llama-3.3-70b-versatile".into(),
                timeout: Duration::from_secs(5),
            },
            RetryPolicy::none(),
        )
        .expect("build provider")
    }

    fn request(model: &str) -> ChatRequest {
        ChatRequest {
            model: model.into(),
            messages: vec![ChatMessage::system("You are terse."), ChatMessage::user("Hi")],
            temperature: Some(0.1),
            max_tokens: None,
        }
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        assert_eq!(
            provider().endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn payload_uses_default_model_and_lowercase_roles() {
        let payload = provider().build_payload(&request(""));
        assert_eq!(payload["model"], "llama-3.3-70b-versatile");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "Hi");
        assert_eq!(payload["temperature"], 0.1);
        assert_eq!(payload["stream"], false);
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn payload_prefers_request_model() {
        let payload = provider().build_payload(&request("mixtral-8x7b"));
        assert_eq!(payload["model"], "mixtral-8x7b");
    }

    #[test]
    fn parses_completion_body() {
        let body = serde_json::json!({
            "model": "llama-3.3-70b-versatile",
            "choices": [{"message": {"role": "assistant", "content": "Q1: 20%"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 8}
        });
        let response = OpenAiProvider::parse_response(&body).expect("parse");
        assert_eq!(response.content, "Q1: 20%");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.prompt_tokens, 120);
        assert_eq!(response.usage.completion_tokens, 8);
    }

    #[test]
    fn missing_choices_is_malformed() {
        let body = serde_json::json!({"model": "x", "choices": []});
        let err = OpenAiProvider::parse_response(&body).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            OpenAiProvider::map_error(401, "invalid api key", None),
            LlmError::AuthenticationError(_)
        ));
        assert!(matches!(
            OpenAiProvider::map_error(429, "slow down", Some(7)),
            LlmError::RateLimitExceeded { retry_after: Some(7) }
        ));
        match OpenAiProvider::map_error(500, &"x".repeat(1000), None) {
            LlmError::ApiError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.len(), MAX_ERROR_BODY);
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "llama-3.3-70b-versatile",
            "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2}
        })
    }

    fn local_provider(server: &wiremock::MockServer) -> OpenAiProvider {
        OpenAiProvider::new(
            OpenAiConfig {
                api_key: "test-key".into(),
                base_url: server.uri(),
                default_model: "llama-3.3-70b-versatile".into(),
                timeout: Duration::from_secs(5),
            },
            RetryPolicy::new(3, Duration::from_millis(1)),
        )
        .expect("build provider")
    }

    async fn request_count(server: &wiremock::MockServer) -> usize {
        server.received_requests().await.map_or(0, |r| r.len())
    }

    #[tokio::test]
    async fn test_complete_retries_after_service_unavailable() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .and(wiremock::matchers::header("authorization", "Bearer test-key"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(completion_body("Q1: 20%")))
            .mount(&server)
            .await;

        let response = local_provider(&server).complete(request("")).await.unwrap();
        assert_eq!(response.content, "Q1: 20%");
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_complete_does_not_retry_rejected_key() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = local_provider(&server).complete(request("")).await.unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationError(ref m) if m.contains("invalid api key")));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_complete_honors_retry_after_on_rate_limit() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(429).insert_header("retry-after", "1"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let response = local_provider(&server).complete(request("")).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(request_count(&server).await, 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_complete_rejects_non_json_body() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/chat/completions"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = local_provider(&server).complete(request("")).await.unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
        assert_eq!(request_count(&server).await, 1);
    }

    #[test]
    fn from_llm_config_copies_settings() {
        let config = LlmConfig::default();
        let provider = OpenAiProvider::from_llm_config(&config, "k").expect("build");
        assert_eq!(provider.model_id(), "llama-3.3-70b-versatile");
        assert_eq!(provider.retry.max_retries, 3);
        assert_eq!(provider.config.timeout, Duration::from_secs(120));
    }
}
