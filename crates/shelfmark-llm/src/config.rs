//! Provider configuration
//!
//! Handles API keys and model selection from the environment.

use serde::{Deserialize, Serialize};
use std::env;

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI API key (env: OPENAI_API_KEY)
    pub openai_api_key: Option<String>,
    /// Base URL of an OpenAI-compatible endpoint (env: SHELFMARK_LLM_BASE_URL)
    pub base_url: String,
    /// Model to use (env: SHELFMARK_LLM_MODEL)
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            base_url: env::var("SHELFMARK_LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: env::var("SHELFMARK_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        }
    }

    /// Whether a real provider can be built from this configuration
    pub fn is_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_configured_with_key() {
        let config = LlmConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        assert!(config.is_configured());
    }
}
