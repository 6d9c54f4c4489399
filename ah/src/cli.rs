//! CLI definition and verbose output formatting

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use crate::r#loop::LoopEvent;

/// ah - run a prompt through a function-calling model with sandboxed file and script tools
#[derive(Debug, Parser)]
#[command(
    name = "ah",
    about = "Run a prompt through a function-calling model with sandboxed file and script tools",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)")]
    pub log_level: Option<String>,

    /// Print the prompt, every tool call with its arguments, tool results and token counts
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory the tools are confined to (default: config, then current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Maximum model round-trips
    #[arg(short, long)]
    pub max_iterations: Option<u32>,

    /// The prompt; multiple words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

impl Cli {
    /// The prompt as a single string
    pub fn prompt(&self) -> String {
        self.prompt.join(" ")
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentharness")
        .join("logs")
        .join("agentharness.log")
}

/// Generate the after_help text with config and log locations
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Config search order:\n");
    help.push_str("  --config <path>\n");
    help.push_str("  ./.agentharness.yml\n");
    if let Some(config_dir) = dirs::config_dir() {
        help.push_str(&format!(
            "  {}\n",
            config_dir.join("agentharness").join("agentharness.yml").display()
        ));
    }

    help.push('\n');
    help.push_str(&format!("Logs: {}\n", get_log_path().display()));
    help
}

/// Render a loop event for verbose output
pub fn describe_event(event: &LoopEvent) -> String {
    match event {
        LoopEvent::ModelResponded {
            round_trip,
            text,
            calls,
            usage,
        } => {
            let mut out = format!(
                "{}\nPrompt tokens: {}\nResponse tokens: {}",
                format!("[round-trip {}]", round_trip).dimmed(),
                usage.input_tokens,
                usage.output_tokens
            );
            if let Some(text) = text {
                out.push_str(&format!("\n{} {}", "Model:".bright_cyan(), text));
            }
            if *calls > 0 {
                out.push_str(&format!("\nFunction calls requested: {}", calls));
            }
            out
        }
        LoopEvent::ToolDispatched { name, arguments } => {
            format!(" - Calling function: {}({})", name.bright_white(), arguments)
        }
        LoopEvent::ToolCompleted { result, .. } => {
            if result.is_error {
                format!("{} {}", "->".red(), result.content)
            } else {
                format!("{} {}", "->".bright_green(), result.content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TokenUsage;
    use crate::tools::ToolResult;

    #[test]
    fn test_cli_parse_prompt_words() {
        let cli = Cli::parse_from(["ah", "list", "the", "files"]);
        assert_eq!(cli.prompt(), "list the files");
        assert!(!cli.verbose);
        assert!(cli.root.is_none());
    }

    #[test]
    fn test_cli_requires_prompt() {
        assert!(Cli::try_parse_from(["ah"]).is_err());
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::parse_from([
            "ah",
            "-v",
            "-r",
            "./calculator",
            "-m",
            "5",
            "-c",
            "/path/to/config.yml",
            "-l",
            "debug",
            "fix the bug",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.root, Some(PathBuf::from("./calculator")));
        assert_eq!(cli.max_iterations, Some(5));
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.prompt(), "fix the bug");
    }

    #[test]
    fn test_describe_events() {
        colored::control::set_override(false);

        let dispatched = LoopEvent::ToolDispatched {
            name: "read_file".to_string(),
            arguments: serde_json::json!({"file_path": "main.py"}),
        };
        assert_eq!(
            describe_event(&dispatched),
            " - Calling function: read_file({\"file_path\":\"main.py\"})"
        );

        let completed = LoopEvent::ToolCompleted {
            name: "read_file".to_string(),
            result: ToolResult::success("print(1)"),
        };
        assert_eq!(describe_event(&completed), "-> print(1)");

        let responded = LoopEvent::ModelResponded {
            round_trip: 1,
            text: None,
            calls: 1,
            usage: TokenUsage {
                input_tokens: 12,
                output_tokens: 3,
            },
        };
        let text = describe_event(&responded);
        assert!(text.contains("Prompt tokens: 12"));
        assert!(text.contains("Response tokens: 3"));
        assert!(text.contains("Function calls requested: 1"));
        assert!(!text.contains("Model:"));

        let answered = LoopEvent::ModelResponded {
            round_trip: 2,
            text: Some("The tests pass.".to_string()),
            calls: 0,
            usage: TokenUsage::default(),
        };
        let text = describe_event(&answered);
        assert!(text.contains("Model: The tests pass."));
        assert!(!text.contains("Function calls requested"));
    }

    #[test]
    fn test_tool_result_is_printed_in_full() {
        colored::control::set_override(false);

        let long = "x".repeat(5000);
        let completed = LoopEvent::ToolCompleted {
            name: "read_file".to_string(),
            result: ToolResult::success(long.clone()),
        };
        assert_eq!(describe_event(&completed), format!("-> {}", long));
    }
}
