//! Dispatch loop module
//!
//! The loop sends the conversation and tool schema to the model, runs any
//! calls it asks for, appends the results, and repeats until the model gives
//! a final answer or the iteration cap is hit.

mod config;
mod engine;
mod error;

pub use config::{DEFAULT_MAX_ITERATIONS, LoopConfig};
pub use engine::{LoopEngine, LoopEvent, LoopOutcome, LoopState};
pub use error::LoopError;
