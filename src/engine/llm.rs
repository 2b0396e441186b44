use async_trait::async_trait;
use serde::Serialize;

use crate::config::{LlmConfig, LlmProvider};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chat-completion seam. The engines only ever see this trait, so tests
/// drive them with scripted fakes instead of a live backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run a completion over the full message list. `json_format` asks the
    /// backend for a JSON-object response where the wire format supports it.
    async fn complete(&self, messages: &[ChatMessage], json_format: bool)
        -> Result<String, AppError>;
}

/// HTTP chat client speaking either the Ollama or the OpenAI-compatible
/// wire format, with bounded retries and linear backoff.
pub struct HttpLlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        match self.config.provider {
            LlmProvider::Ollama => format!("{}/api/chat", self.config.base_url),
            LlmProvider::OpenAiCompatible => {
                format!("{}/chat/completions", self.config.base_url)
            }
        }
    }

    fn request_body(&self, messages: &[ChatMessage], json_format: bool) -> serde_json::Value {
        match self.config.provider {
            LlmProvider::Ollama => {
                let mut body = serde_json::json!({
                    "model": self.config.model,
                    "messages": messages,
                    "stream": false,
                });
                if json_format {
                    body["format"] = serde_json::json!("json");
                }
                body
            }
            LlmProvider::OpenAiCompatible => {
                let mut body = serde_json::json!({
                    "model": self.config.model,
                    "messages": messages,
                    "temperature": 0.4,
                });
                if json_format {
                    body["response_format"] = serde_json::json!({ "type": "json_object" });
                }
                body
            }
        }
    }

    fn extract_content(&self, data: &serde_json::Value) -> String {
        let content = match self.config.provider {
            LlmProvider::Ollama => data
                .pointer("/message/content")
                .and_then(|c| c.as_str())
                .or_else(|| data.get("response").and_then(|c| c.as_str())),
            LlmProvider::OpenAiCompatible => data
                .pointer("/choices/0/message/content")
                .and_then(|c| c.as_str()),
        };
        content.unwrap_or_default().to_string()
    }

    fn should_retry(status: reqwest::StatusCode) -> bool {
        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

#[async_trait]
impl ChatBackend for HttpLlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        json_format: bool,
    ) -> Result<String, AppError> {
        let url = self.endpoint();
        let body = self.request_body(messages, json_format);

        for attempt in 0..=self.config.max_retries {
            let backoff = self.config.retry_delay * (attempt + 1);
            let mut request = self.http.post(&url).json(&body);
            if let Some(ref key) = self.config.api_key {
                request = request.bearer_auth(key);
            }
            let result = request.send().await;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let data: serde_json::Value = resp
                            .json()
                            .await
                            .map_err(|e| AppError::Llm(format!("invalid response body: {e}")))?;
                        return Ok(self.extract_content(&data));
                    }
                    let text = resp.text().await.unwrap_or_default();
                    if Self::should_retry(status) && attempt < self.config.max_retries {
                        tracing::warn!(%status, attempt, "LLM backend error, retrying");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(AppError::Llm(format!("backend error {status}: {text}")));
                }
                // Connect errors and timeouts are retryable; anything else
                // (e.g. a malformed URL) will not improve on retry.
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.config.max_retries => {
                    tracing::warn!(error = %e, attempt, "LLM request failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(AppError::Llm(format!("request failed: {e}"))),
            }
        }

        Err(AppError::Llm("request failed after retries".into()))
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Scripted backend: pops one canned response per call, errors when the
    /// script runs out.
    pub struct ScriptedBackend {
        responses: Mutex<Vec<Result<String, String>>>,
        pub calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        pub fn new(responses: Vec<Result<String, String>>) -> Self {
            let mut reversed = responses;
            reversed.reverse();
            Self {
                responses: Mutex::new(reversed),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(response: &str) -> Self {
            Self::new(vec![Ok(response.to_string())])
        }

        pub fn failing() -> Self {
            Self::new(vec![])
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _json_format: bool,
        ) -> Result<String, AppError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            match self.responses.lock().unwrap().pop() {
                Some(Ok(text)) => Ok(text),
                Some(Err(msg)) => Err(AppError::Llm(msg)),
                None => Err(AppError::Llm("backend unreachable".into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(provider: LlmProvider) -> LlmConfig {
        LlmConfig {
            provider,
            model: "test-model".into(),
            base_url: "http://localhost:9".into(),
            api_key: None,
            max_retries: 0,
            retry_delay: Duration::from_millis(1),
            timeout: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_ollama_request_body() {
        let client = HttpLlmClient::new(config(LlmProvider::Ollama)).unwrap();
        let body = client.request_body(&[ChatMessage::user("hi")], true);
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_openai_request_body() {
        let client = HttpLlmClient::new(config(LlmProvider::OpenAiCompatible)).unwrap();
        let body = client.request_body(&[ChatMessage::system("s")], true);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_extract_content_per_provider() {
        let ollama = HttpLlmClient::new(config(LlmProvider::Ollama)).unwrap();
        let data = serde_json::json!({ "message": { "content": "hello" } });
        assert_eq!(ollama.extract_content(&data), "hello");

        let openai = HttpLlmClient::new(config(LlmProvider::OpenAiCompatible)).unwrap();
        let data = serde_json::json!({ "choices": [{ "message": { "content": "hi" } }] });
        assert_eq!(openai.extract_content(&data), "hi");

        assert_eq!(openai.extract_content(&serde_json::json!({})), "");
    }

    #[test]
    fn test_endpoint_per_provider() {
        let ollama = HttpLlmClient::new(config(LlmProvider::Ollama)).unwrap();
        assert!(ollama.endpoint().ends_with("/api/chat"));
        let openai = HttpLlmClient::new(config(LlmProvider::OpenAiCompatible)).unwrap();
        assert!(openai.endpoint().ends_with("/chat/completions"));
    }
}
