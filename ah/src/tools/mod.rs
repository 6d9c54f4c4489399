//! Tool system for the dispatch loop
//!
//! Tools provide directory listing, file reads and writes, and script
//! execution to the model. Every tool receives a `ToolContext` scoped to the
//! sandbox root - tools cannot escape it.

mod context;
mod error;
mod registry;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolKind, ToolResult};
