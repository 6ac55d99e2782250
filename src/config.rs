use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Value shipped in the sample `.env`; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub model: String,
    pub research_temperature: f32,
    pub visualization_temperature: f32,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: u64,
}

impl LLMConfig {
    /// Whether a usable API key is configured. Without one the research
    /// step switches to mock mode.
    pub fn has_credentials(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }

    /// Key prefix safe to print in startup logs
    pub fn masked_key(&self) -> String {
        let prefix: String = self.api_key.chars().take(10).collect();
        format!("{}...", prefix)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// Hand-written so the key never ends up in a `{:?}` log line.
impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.masked_key())
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("research_temperature", &self.research_temperature)
            .field("visualization_temperature", &self.visualization_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            llm: LLMConfig {
                provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "perplexity".to_string()),
                api_key: env::var("PERPLEXITY_API_KEY").unwrap_or_default(),
                api_base: env::var("LLM_API_BASE").ok().filter(|s| !s.trim().is_empty()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "sonar-pro".to_string()),
                research_temperature: env::var("RESEARCH_TEMPERATURE")
                    .unwrap_or_else(|_| "0.5".to_string())
                    .parse()?,
                visualization_temperature: env::var("VISUALIZATION_TEMPERATURE")
                    .unwrap_or_else(|_| "1.5".to_string())
                    .parse()?,
                max_tokens: env::var("LLM_MAX_TOKENS")
                    .ok()
                    .map(|s| s.parse())
                    .transpose()?,
                request_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
            },
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_llm_config(api_key: &str) -> LLMConfig {
        LLMConfig {
            provider: "perplexity".to_string(),
            api_key: api_key.to_string(),
            api_base: None,
            model: "sonar-pro".to_string(),
            research_temperature: 0.5,
            visualization_temperature: 1.5,
            max_tokens: None,
            request_timeout_secs: 60,
        }
    }

    #[test]
    fn test_has_credentials() {
        assert!(test_llm_config("pplx-1234567890abcdef").has_credentials());
        assert!(!test_llm_config("").has_credentials());
        assert!(!test_llm_config("   ").has_credentials());
        assert!(!test_llm_config(PLACEHOLDER_API_KEY).has_credentials());
    }

    #[test]
    fn test_masked_key_hides_secret() {
        let config = test_llm_config("pplx-1234567890abcdef");
        assert_eq!(config.masked_key(), "pplx-12345...");

        let debug = format!("{:?}", config);
        assert!(!debug.contains("abcdef"));
    }
}
