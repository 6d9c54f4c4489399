//! LLM client module
//!
//! Provider-neutral completion types, the client trait, and the Gemini and
//! Anthropic implementations.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod gemini;
mod http;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use gemini::GeminiClient;
pub use types::{CompletionRequest, CompletionResponse, StopReason, TokenUsage, ToolCall, ToolDefinition};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Supports "gemini" and "anthropic" providers. Fails when the API key
/// environment variable is unset.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "gemini" => {
            debug!("create_client: creating Gemini client");
            Ok(Arc::new(GeminiClient::from_config(config)?))
        }
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::UnknownProvider(other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_create_client_unknown_provider() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            ..LlmConfig::default()
        };

        let err = create_client(&config).err().unwrap();
        assert!(matches!(err, LlmError::UnknownProvider(ref p) if p == "openai"));
    }

    #[test]
    #[serial]
    fn test_create_client_missing_key() {
        let config = LlmConfig {
            api_key_env: "AH_TEST_NO_SUCH_KEY".to_string(),
            ..LlmConfig::default()
        };

        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::remove_var("AH_TEST_NO_SUCH_KEY") };
        let err = create_client(&config).err().unwrap();
        assert!(matches!(err, LlmError::MissingApiKey { ref env } if env == "AH_TEST_NO_SUCH_KEY"));
    }

    #[test]
    #[serial]
    fn test_create_client_for_each_provider() {
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::set_var("AH_TEST_CLIENT_KEY", "k") };
        for (provider, model) in [("gemini", "gemini-2.0-flash-001"), ("anthropic", "claude-sonnet-4")] {
            let config = LlmConfig {
                provider: provider.to_string(),
                model: model.to_string(),
                api_key_env: "AH_TEST_CLIENT_KEY".to_string(),
                ..LlmConfig::default()
            };
            let client = create_client(&config).unwrap();
            assert_eq!(client.model(), model);
        }
        unsafe { std::env::remove_var("AH_TEST_CLIENT_KEY") };
    }
}
