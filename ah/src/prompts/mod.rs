//! Prompt templates
//!
//! `.pmt` files are compiled into the binary; the config file can replace
//! the system prompt at runtime.

pub mod embedded;

pub use embedded::SYSTEM;
