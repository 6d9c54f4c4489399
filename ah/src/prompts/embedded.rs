//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

/// System prompt seeded at the start of every conversation
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_is_embedded() {
        assert!(SYSTEM.contains("function call plan"));
        assert!(SYSTEM.contains("relative to the working directory"));
    }
}
