use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::LLMConfig;
use crate::llm::openai::OpenAIAdapter;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

const PERPLEXITY_API_BASE: &str = "https://api.perplexity.ai";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const GOOGLE_OPENAI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Resolve the chat completions base URL for a provider name
pub fn api_base_for(provider: &str) -> AppResult<&'static str> {
    match provider.to_lowercase().as_str() {
        "perplexity" => Ok(PERPLEXITY_API_BASE),
        "openai" => Ok(OPENAI_API_BASE),
        "groq" => Ok(GROQ_API_BASE),
        "google" | "gemini" => Ok(GOOGLE_OPENAI_API_BASE),
        other => Err(AppError::Config(format!("Unsupported LLM provider: {}", other))),
    }
}

/// Build the adapter selected by the configuration
pub fn create_adapter(config: &LLMConfig) -> AppResult<Arc<dyn LLMAdapter>> {
    let api_base = match &config.api_base {
        Some(base) => base.clone(),
        None => api_base_for(&config.provider)?.to_string(),
    };

    Ok(Arc::new(OpenAIAdapter::new_with_api_base(&config.api_key, &api_base)))
}

/// Per-client settings. Two clients built from the same `LLMConfig` differ
/// only in temperature.
#[derive(Debug, Clone)]
pub struct LLMClientConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

/// Immutable chat client. Cloning shares the underlying adapter.
#[derive(Clone)]
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    config: LLMClientConfig,
}

impl LLM {
    pub fn new(adapter: Arc<dyn LLMAdapter>, config: LLMClientConfig) -> Self {
        Self { adapter, config }
    }

    /// Client over `adapter` using the model, token and timeout settings of
    /// `llm_config` at the given temperature
    pub fn with_temperature(
        adapter: Arc<dyn LLMAdapter>,
        llm_config: &LLMConfig,
        temperature: f32,
    ) -> Self {
        Self::new(
            adapter,
            LLMClientConfig {
                model: llm_config.model.clone(),
                temperature,
                max_tokens: llm_config.max_tokens,
                timeout: llm_config.request_timeout(),
            },
        )
    }

    pub fn config(&self) -> &LLMClientConfig {
        &self.config
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }

    /// Send `prompt` as a single user message and return the reply text.
    /// Bounded by the configured timeout; never retried.
    pub async fn invoke(&self, prompt: &str) -> AppResult<String> {
        let request = LLMRequest {
            model: self.config.model.clone(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
        };

        let response = tokio::time::timeout(self.config.timeout, self.create_chat_completion(&request))
            .await
            .map_err(|_| AppError::Timeout(self.config.timeout.as_secs()))??;

        debug!(
            model = %self.config.model,
            finish_reason = %response.finish_reason,
            total_tokens = response.usage.total_tokens,
            "LLM call completed"
        );

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenUsage;
    use std::sync::Mutex;

    struct RecordingAdapter {
        seen: Mutex<Vec<LLMRequest>>,
    }

    #[async_trait]
    impl LLMAdapter for RecordingAdapter {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(LLMResponse {
                content: "ok".to_string(),
                finish_reason: "stop".to_string(),
                usage: TokenUsage::default(),
            })
        }
    }

    struct SlowAdapter;

    #[async_trait]
    impl LLMAdapter for SlowAdapter {
        async fn create_chat_completion(&self, _request: &LLMRequest) -> AppResult<LLMResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(AppError::Internal("unreachable".to_string()))
        }
    }

    fn client_config(temperature: f32, timeout: Duration) -> LLMClientConfig {
        LLMClientConfig {
            model: "sonar-pro".to_string(),
            temperature,
            max_tokens: Some(512),
            timeout,
        }
    }

    #[test]
    fn test_api_base_for_known_providers() {
        assert_eq!(api_base_for("perplexity").unwrap(), PERPLEXITY_API_BASE);
        assert_eq!(api_base_for("Groq").unwrap(), GROQ_API_BASE);
        assert_eq!(api_base_for("gemini").unwrap(), GOOGLE_OPENAI_API_BASE);
        assert!(matches!(api_base_for("unknown"), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_invoke_sends_single_user_message() {
        let adapter = Arc::new(RecordingAdapter { seen: Mutex::new(Vec::new()) });
        let llm = LLM::new(adapter.clone(), client_config(1.5, Duration::from_secs(5)));

        let content = llm.invoke("chart this").await.unwrap();
        assert_eq!(content, "ok");

        let seen = adapter.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages, vec![LLMMessage::user("chart this")]);
        assert_eq!(seen[0].temperature, Some(1.5));
        assert_eq!(seen[0].max_tokens, Some(512));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_times_out() {
        let llm = LLM::new(Arc::new(SlowAdapter), client_config(0.5, Duration::from_secs(2)));

        let err = llm.invoke("slow").await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(2)));
    }
}
