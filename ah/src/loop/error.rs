//! Loop error types

use thiserror::Error;

use crate::llm::LlmError;

/// Fatal outcomes of a dispatch loop run
///
/// Tool failures never show up here; they are fed back to the model as
/// results. Only the model call itself and the iteration cap end a run.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("Model request failed: {0}")]
    ExternalService(#[from] LlmError),

    #[error("Model returned no usable response on round-trip {round_trip}")]
    EmptyResponse { round_trip: u32 },

    #[error("Max iterations ({max}) reached without a final response")]
    IterationCapExceeded { max: u32 },
}

impl LoopError {
    /// Short label for logs
    pub fn category(&self) -> &'static str {
        match self {
            LoopError::ExternalService(_) | LoopError::EmptyResponse { .. } => "external_service",
            LoopError::IterationCapExceeded { .. } => "iteration_cap",
        }
    }
}
