//! ah - sandboxed tool-dispatch agent
//!
//! CLI entry point: runs one prompt through the dispatch loop and prints the
//! model's final answer.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use agentharness::cli::{Cli, describe_event, generate_after_help, get_log_path};
use agentharness::config::Config;
use agentharness::llm::create_client;
use agentharness::r#loop::{LoopConfig, LoopEngine};
use agentharness::tools::builtin::RunScriptTool;
use agentharness::tools::{ToolContext, ToolRegistry};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Sandbox root: --root, then config, then the current directory
fn sandbox_root(cli: &Cli, config: &Config) -> Result<PathBuf> {
    match cli.root.clone().or_else(|| config.sandbox.root.clone()) {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "ah loaded config");

    if let Some(max) = cli.max_iterations {
        debug!(max, "main: max iterations overridden on command line");
        config.agent.max_iterations = max;
    }
    config.validate()?;

    let root = sandbox_root(&cli, &config)?;
    let ctx = ToolContext::new(&root).with_context(|| format!("Invalid sandbox root {}", root.display()))?;
    info!(root = %ctx.root().display(), "Sandbox root resolved");

    let llm = create_client(&config.llm).context("Failed to create model client")?;
    let script_runner = RunScriptTool::new(&config.sandbox.interpreter, &config.sandbox.script_extension);
    let registry = ToolRegistry::standard(ctx, script_runner);
    let mut engine = LoopEngine::new(llm, registry, LoopConfig::from_config(&config));

    let prompt = cli.prompt();
    let printer = if cli.verbose {
        println!("{} {}", "User prompt:".bright_cyan(), prompt);
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine = engine.with_events(tx);
        Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                println!("{}", describe_event(&event));
            }
        }))
    } else {
        None
    };

    let result = engine.run(&prompt).await;
    drop(engine);
    if let Some(printer) = printer {
        printer.await.context("Verbose printer task failed")?;
    }

    let outcome = result.context("Agent run failed")?;
    info!(round_trips = outcome.round_trips, "ah finished");

    if cli.verbose {
        println!(
            "{} {} round-trips, {} prompt tokens, {} response tokens",
            "Total:".bright_cyan(),
            outcome.round_trips,
            outcome.usage.input_tokens,
            outcome.usage.output_tokens
        );
    }
    println!("Final response:");
    println!("{}", outcome.text);
    Ok(())
}
