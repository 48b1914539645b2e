//! `run_python_inline`: the built-in function tool.
//!
//! The model sends `{"code": "..."}`; the script runs under the local Python
//! interpreter and its exit code, stdout and stderr are folded into one text
//! block the model can read.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::tooling::config::{DEFAULT_SHELL_MAX_OUTPUT_CHARS, DEFAULT_SHELL_TIMEOUT};
use crate::tooling::descriptor::ToolDescriptor;
use crate::tooling::executor::FunctionHandler;

pub const RUN_PYTHON_INLINE: &str = "run_python_inline";

/// Exit code reported when no interpreter could be started.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code reported when the script was killed on timeout.
pub const EXIT_TIMED_OUT: i32 = 124;

const INTERPRETERS: &[&str] = &["python3", "python", "py"];

/// Captured result of one script run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Runs an inline Python script.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run_inline(&self, script: &str) -> ScriptOutput;
}

/// Spawns a local interpreter process per script.
#[derive(Debug, Clone)]
pub struct ProcessScriptRunner {
    interpreters: Vec<String>,
    timeout: Duration,
    max_output_chars: usize,
}

impl Default for ProcessScriptRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL_TIMEOUT, DEFAULT_SHELL_MAX_OUTPUT_CHARS)
    }
}

impl ProcessScriptRunner {
    pub fn new(timeout: Duration, max_output_chars: usize) -> Self {
        Self {
            interpreters: INTERPRETERS.iter().map(|s| s.to_string()).collect(),
            timeout,
            max_output_chars,
        }
    }

    /// Override the interpreter candidates, tried in order.
    pub fn with_interpreters<I, S>(mut self, interpreters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreters = interpreters.into_iter().map(Into::into).collect();
        self
    }

    async fn run_with(&self, interpreter: &str, script: &str) -> std::io::Result<ScriptOutput> {
        let child = Command::new(interpreter)
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output?;
                Ok(ScriptOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code().unwrap_or(1),
                })
            }
            // Dropping the future drops the child, which kills it.
            Err(_) => {
                warn!(interpreter, timeout_ms = self.timeout.as_millis() as u64, "inline script timed out");
                Ok(ScriptOutput {
                    stdout: String::new(),
                    stderr: format!(
                        "Script timed out after {} ms and was terminated.",
                        self.timeout.as_millis()
                    ),
                    exit_code: EXIT_TIMED_OUT,
                })
            }
        }
    }
}

#[async_trait]
impl ScriptRunner for ProcessScriptRunner {
    async fn run_inline(&self, script: &str) -> ScriptOutput {
        let mut last_error = None;
        for interpreter in &self.interpreters {
            match self.run_with(interpreter, script).await {
                Ok(output) => return truncate_output(output, self.max_output_chars),
                Err(e) => {
                    debug!(interpreter = %interpreter, error = %e, "interpreter unavailable");
                    last_error = Some(e);
                }
            }
        }

        ScriptOutput {
            stdout: String::new(),
            stderr: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Python interpreter unavailable".to_string()),
            exit_code: EXIT_NOT_FOUND,
        }
    }
}

/// Bound the combined stdout + stderr to `max_chars`; stdout is kept first.
pub fn truncate_output(mut output: ScriptOutput, max_chars: usize) -> ScriptOutput {
    let stdout_len = output.stdout.chars().count();
    let stderr_len = output.stderr.chars().count();
    if stdout_len + stderr_len <= max_chars {
        return output;
    }

    let keep_stdout = stdout_len.min(max_chars);
    let keep_stderr = max_chars - keep_stdout;
    output.stdout = output.stdout.chars().take(keep_stdout).collect();
    output.stderr = output.stderr.chars().take(keep_stderr).collect();
    output
        .stderr
        .push_str(&format!("\n[output truncated to {} characters]", max_chars));
    output
}

/// Text handed back to the model for a finished script.
pub fn format_script_output(output: &ScriptOutput) -> String {
    let stdout = output.stdout.trim();
    let stderr = output.stderr.trim();

    if output.exit_code != 0 {
        let mut lines = vec![
            format!("python_exit_code={}", output.exit_code),
            format!(
                "stderr={}",
                if stderr.is_empty() { "(no details)" } else { stderr }
            ),
        ];
        if !stdout.is_empty() {
            lines.push(format!("stdout={}", stdout));
        }
        return lines.join("\n");
    }

    if stdout.is_empty() {
        "(no output)".to_string()
    } else {
        stdout.to_string()
    }
}

pub fn missing_code_output() -> String {
    "python_exit_code=2\nstderr=Parameter `code` missing or invalid.".to_string()
}

/// Descriptor advertised to the model.
pub fn run_python_inline_descriptor() -> ToolDescriptor {
    ToolDescriptor::function(
        RUN_PYTHON_INLINE,
        "Runs inline Python code on the local machine and returns stdout/stderr to help answer.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python code to run inline."
                }
            },
            "required": ["code"]
        }),
    )
}

/// Function handler backing `run_python_inline`.
#[derive(Clone)]
pub struct RunPythonInline {
    runner: Arc<dyn ScriptRunner>,
}

impl RunPythonInline {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl FunctionHandler for RunPythonInline {
    async fn call(&self, arguments: Value) -> String {
        let code = arguments
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if code.trim().is_empty() {
            return missing_code_output();
        }

        let output = self.runner.run_inline(code).await;
        debug!(exit_code = output.exit_code, "inline script finished");
        format_script_output(&output)
    }
}
