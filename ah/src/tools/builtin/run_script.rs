//! run_script tool - execute a script inside the sandbox with a hard timeout

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::tools::{Tool, ToolContext, ToolError, ToolKind, ToolResult};

/// Wall-clock budget for a single script run
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Payload returned when a script exits cleanly without printing anything
pub const NO_OUTPUT: &str = "No output produced.";

/// Execute a script with an interpreter, working directory set to the sandbox root
pub struct RunScriptTool {
    interpreter: String,
    extension: String,
    timeout: Duration,
}

impl RunScriptTool {
    /// Create a runner for scripts ending in `.{extension}`, run by `interpreter`
    pub fn new(interpreter: impl Into<String>, extension: impl Into<String>) -> Self {
        let interpreter = interpreter.into();
        let extension = extension.into().trim_start_matches('.').to_string();
        debug!(%interpreter, %extension, "RunScriptTool::new: called");
        Self {
            interpreter,
            extension,
            timeout: SCRIPT_TIMEOUT,
        }
    }

    /// Override the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, path: &str, args: Vec<String>, ctx: &ToolContext) -> Result<String, ToolError> {
        let full_path = ctx.resolve(path, "execute")?;

        if !full_path.exists() {
            return Err(ToolError::NotFound {
                what: "File",
                path: path.into(),
            });
        }

        let has_extension = full_path.extension().is_some_and(|ext| ext == self.extension.as_str());
        if !full_path.is_file() || !has_extension {
            debug!(?full_path, extension = %self.extension, "RunScriptTool::run: not a script");
            return Err(ToolError::WrongKind {
                path: path.into(),
                reason: format!("is not a .{} script", self.extension),
            });
        }

        let mut command = Command::new(&self.interpreter);
        command
            .arg(&full_path)
            .args(&args)
            .current_dir(ctx.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down anything the script forked
        #[cfg(unix)]
        command.process_group(0);

        debug!(interpreter = %self.interpreter, ?full_path, ?args, "RunScriptTool::run: spawning");
        let mut child = command
            .spawn()
            .map_err(|e| ToolError::io(self.interpreter.as_str(), e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collect = async {
            let (status, out, err) = tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr));
            Ok::<_, std::io::Error>((status?, out?, err?))
        };

        match tokio::time::timeout(self.timeout, collect).await {
            Ok(Ok((status, out, err))) => {
                debug!(?status, stdout_len = out.len(), stderr_len = err.len(), "RunScriptTool::run: finished");
                Ok(format_output(
                    &String::from_utf8_lossy(&out),
                    &String::from_utf8_lossy(&err),
                    status,
                ))
            }
            Ok(Err(e)) => {
                terminate(&mut child).await;
                Err(ToolError::io(path, e))
            }
            Err(_) => {
                info!(%path, timeout = ?self.timeout, "Script timed out, killing it");
                terminate(&mut child).await;
                Err(ToolError::Timeout {
                    path: path.into(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

impl Default for RunScriptTool {
    fn default() -> Self {
        Self::new("python3", "py")
    }
}

/// Kill the child's process group and the child itself, then reap it
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!(%pid, %e, "terminate: killpg failed");
        }
    }

    // kill() also waits, so no zombie is left behind
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill script process");
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Compose the model-facing payload from captured output and exit status
fn format_output(stdout: &str, stderr: &str, status: ExitStatus) -> String {
    let mut sections = Vec::new();

    if !stdout.is_empty() {
        sections.push(format!("STDOUT:\n{}", stdout));
    }
    if !stderr.is_empty() {
        sections.push(format!("STDERR:\n{}", stderr));
    }
    match status.code() {
        Some(0) => {}
        Some(code) => sections.push(format!("Process exited with code {}", code)),
        None => sections.push("Process terminated by a signal".to_string()),
    }

    if sections.is_empty() {
        NO_OUTPUT.to_string()
    } else {
        sections.join("\n")
    }
}

/// Accept `args` as a single string, a list of strings, or absent
fn parse_args(value: &Value) -> Result<Vec<String>, ToolError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ToolError::InvalidArgument("args must contain only strings".to_string()))
            })
            .collect(),
        _ => Err(ToolError::InvalidArgument(
            "args must be a string or a list of strings".to_string(),
        )),
    }
}

#[async_trait]
impl Tool for RunScriptTool {
    fn kind(&self) -> ToolKind {
        ToolKind::RunScript
    }

    fn description(&self) -> &'static str {
        "Executes a script file with optional command-line arguments, constrained to the working directory. Returns its stdout, stderr and exit code."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the script to execute, relative to the working directory."
                },
                "args": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional arguments passed to the script, in order."
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        debug!(?input, "RunScriptTool::execute: called");
        let Some(path) = input["file_path"].as_str() else {
            return ToolError::InvalidArgument("file_path is required".to_string()).into();
        };
        let args = match parse_args(&input["args"]) {
            Ok(args) => args,
            Err(e) => return e.into(),
        };
        self.run(path, args, ctx).await.into()
    }
}
