//! Loop configuration

use tracing::debug;

use crate::config::Config;
use crate::prompts;

/// Default bound on model round-trips per prompt
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Settings for one dispatch loop run
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Maximum model round-trips before giving up
    pub max_iterations: u32,

    /// Max tokens per model response
    pub max_tokens: u32,

    /// System prompt seeded as the first turn
    pub system_prompt: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: 8192,
            system_prompt: prompts::SYSTEM.to_string(),
        }
    }
}

impl LoopConfig {
    /// Derive loop settings from the application config
    pub fn from_config(config: &Config) -> Self {
        debug!(max_iterations = config.agent.max_iterations, "LoopConfig::from_config: called");
        Self {
            max_iterations: config.agent.max_iterations,
            max_tokens: config.llm.max_tokens,
            system_prompt: config
                .agent
                .system_prompt
                .clone()
                .unwrap_or_else(|| prompts::SYSTEM.to_string()),
        }
    }
}
