//! LoopEngine - drives the model/tool round-trips for one prompt

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::conversation::Conversation;
use crate::llm::{CompletionRequest, LlmClient, TokenUsage, ToolDefinition};
use crate::tools::{ToolRegistry, ToolResult};

use super::{LoopConfig, LoopError};

/// Where the loop is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting on the model's next response
    AwaitingModel,
    /// Running the calls from the latest model turn
    DispatchingTools,
    /// The model gave a final answer
    Done,
    /// The model call failed or the iteration cap was hit
    Failed,
}

/// Progress notifications for observers (verbose output)
#[derive(Debug, Clone)]
pub enum LoopEvent {
    /// The model answered a round-trip
    ModelResponded {
        round_trip: u32,
        text: Option<String>,
        calls: usize,
        usage: TokenUsage,
    },
    /// A tool call is about to run, with the arguments it will receive
    ToolDispatched { name: String, arguments: Value },
    /// A tool call finished
    ToolCompleted { name: String, result: ToolResult },
}

/// Successful end of a run
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// The model's final answer
    pub text: String,
    /// Number of model round-trips taken
    pub round_trips: u32,
    /// Token usage summed over all round-trips
    pub usage: TokenUsage,
}

/// Dispatch loop execution engine
pub struct LoopEngine {
    config: LoopConfig,
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    tool_defs: Vec<ToolDefinition>,
    conversation: Conversation,
    state: LoopState,
    usage: TokenUsage,
    events: Option<mpsc::UnboundedSender<LoopEvent>>,
}

impl LoopEngine {
    /// Create a new loop engine
    pub fn new(llm: Arc<dyn LlmClient>, registry: ToolRegistry, config: LoopConfig) -> Self {
        debug!(model = %llm.model(), max_iterations = config.max_iterations, "LoopEngine::new: called");
        let tool_defs = registry.definitions();
        Self {
            config,
            llm,
            registry,
            tool_defs,
            conversation: Conversation::new(),
            state: LoopState::AwaitingModel,
            usage: TokenUsage::default(),
            events: None,
        }
    }

    /// Send progress events to `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<LoopEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Conversation of the current (or last) run
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run the loop for `prompt` until a final answer or a fatal failure
    pub async fn run(&mut self, prompt: &str) -> Result<LoopOutcome, LoopError> {
        debug!(prompt_len = prompt.len(), "LoopEngine::run: called");
        info!(
            "Starting run (model: {}, max_iterations: {})",
            self.llm.model(),
            self.config.max_iterations
        );

        self.conversation = Conversation::seeded(self.config.system_prompt.clone(), prompt);
        self.usage = TokenUsage::default();
        self.state = LoopState::AwaitingModel;

        for round_trip in 1..=self.config.max_iterations {
            self.state = LoopState::AwaitingModel;
            debug!(round_trip, turns = self.conversation.len(), "LoopEngine::run: calling model");

            let request = CompletionRequest {
                turns: self.conversation.turns().to_vec(),
                tools: self.tool_defs.clone(),
                max_tokens: self.config.max_tokens,
            };

            let response = match self.llm.complete(request).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(round_trip, "Model request failed");
                    return Err(self.fail(e.into()));
                }
            };
            self.usage.add(&response.usage);
            debug!(
                round_trip,
                stop_reason = ?response.stop_reason,
                calls = response.tool_calls.len(),
                "LoopEngine::run: model responded"
            );

            self.emit(LoopEvent::ModelResponded {
                round_trip,
                text: response.content.clone(),
                calls: response.tool_calls.len(),
                usage: response.usage,
            });

            if response.is_empty() {
                warn!(round_trip, "Model returned neither text nor tool calls");
                return Err(self.fail(LoopError::EmptyResponse { round_trip }));
            }

            self.conversation
                .push_model(response.content.clone(), response.tool_calls.clone());

            if response.tool_calls.is_empty() {
                self.state = LoopState::Done;
                info!(round_trip, "Run complete");
                return Ok(LoopOutcome {
                    text: response.content.unwrap_or_default(),
                    round_trips: round_trip,
                    usage: self.usage,
                });
            }

            self.state = LoopState::DispatchingTools;
            for call in &response.tool_calls {
                let arguments = self
                    .registry
                    .resolve_arguments(&call.arguments)
                    .unwrap_or_else(|_| call.arguments.clone());
                self.emit(LoopEvent::ToolDispatched {
                    name: call.name.clone(),
                    arguments,
                });

                let result = self.registry.dispatch(call).await;
                debug!(name = %call.name, is_error = result.is_error, "LoopEngine::run: tool result");

                self.emit(LoopEvent::ToolCompleted {
                    name: call.name.clone(),
                    result: result.clone(),
                });
                self.conversation.push_tool(call, result);
            }
        }

        warn!(max = self.config.max_iterations, "Max iterations reached");
        Err(self.fail(LoopError::IterationCapExceeded {
            max: self.config.max_iterations,
        }))
    }

    /// Enter the failed state and hand back `err`
    fn fail(&mut self, err: LoopError) -> LoopError {
        self.state = LoopState::Failed;
        warn!(category = err.category(), error = %err, "Run failed");
        err
    }

    fn emit(&self, event: LoopEvent) {
        if let Some(tx) = &self.events
            && tx.send(event).is_err()
        {
            debug!("LoopEngine::emit: observer gone");
        }
    }
}
