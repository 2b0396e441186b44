use std::time::Duration;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 400;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_BASE_URL: &str = "https://merchforge.example.com";

/// Which chat-completion wire format the backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Ollama's native `/api/chat` endpoint.
    Ollama,
    /// Any OpenAI-compatible `/chat/completions` endpoint (Groq, vLLM, ...).
    OpenAiCompatible,
}

/// LLM transport configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Build from environment variables.
    ///
    /// `LLM_PROVIDER=openai` requires `LLM_API_BASE` and `LLM_API_KEY`;
    /// anything else defaults to a local Ollama instance.
    pub fn from_env() -> Self {
        let provider = std::env::var("LLM_PROVIDER")
            .unwrap_or_default()
            .to_lowercase();

        let max_retries = env_parse("LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES);
        let retry_delay = Duration::from_millis(env_parse("LLM_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS));
        let timeout = Duration::from_millis(env_parse("LLM_TIMEOUT_MS", DEFAULT_TIMEOUT_MS));

        if provider == "openai" || provider == "groq" {
            return Self {
                provider: LlmProvider::OpenAiCompatible,
                model: std::env::var("LLM_MODEL")
                    .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
                base_url: std::env::var("LLM_API_BASE")
                    .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
                api_key: std::env::var("LLM_API_KEY").ok(),
                max_retries,
                retry_delay,
                timeout,
            };
        }

        Self {
            provider: LlmProvider::Ollama,
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "qwen2.5:14b".to_string()),
            base_url: std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
            api_key: None,
            max_retries,
            retry_delay,
            timeout,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub public_base_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string());
        let public_base_url = normalize_base_url(std::env::var("PUBLIC_BASE_URL").ok().as_deref());
        Self {
            bind,
            public_base_url,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn normalize_base_url(value: Option<&str>) -> String {
    match value {
        None | Some("") => DEFAULT_BASE_URL.to_string(),
        Some(v) if v.starts_with("http://") || v.starts_with("https://") => {
            v.trim_end_matches('/').to_string()
        }
        Some(v) => format!("https://{}", v.trim_end_matches('/')),
    }
}

/// Resolve a possibly-relative image/product URL against the public base URL.
pub fn to_absolute_url(base: &str, url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}
