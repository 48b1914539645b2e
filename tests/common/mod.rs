//! Shared fixtures: a scripted transport and a recording script runner.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alicia_runtime::tooling::{ScriptOutput, ScriptRunner};
use alicia_runtime::types::{ResponsesRequest, ResponsesResponse};
use alicia_runtime::{
    Error, ResponsesAssistant, ResponsesAssistantBuilder, ResponsesTransport, Result,
    RuntimeSettings, ToolingConfig,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::Instant;

/// Replays queued results in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ResponsesResponse>>>,
    requests: Mutex<Vec<(Instant, ResponsesRequest)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, body: Value) -> &Self {
        let response = serde_json::from_value(body).expect("valid response fixture");
        self.push(Ok(response))
    }

    pub fn fail(&self, status: u16, message: &str) -> &Self {
        self.push(Err(Error::Remote {
            status,
            message: message.to_string(),
        }))
    }

    pub fn push(&self, result: Result<ResponsesResponse>) -> &Self {
        self.replies.lock().unwrap().push_back(result);
        self
    }

    pub fn requests(&self) -> Vec<ResponsesRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn request_times(&self) -> Vec<Instant> {
        self.requests.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    /// Tool names advertised by each recorded request.
    pub fn tool_names(&self) -> Vec<Vec<String>> {
        self.requests()
            .iter()
            .map(|r| {
                r.tools
                    .iter()
                    .flatten()
                    .map(|t| t.name().to_string())
                    .collect()
            })
            .collect()
    }
}

#[async_trait]
impl ResponsesTransport for ScriptedTransport {
    async fn create_response(&self, request: &ResponsesRequest) -> Result<ResponsesResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::protocol("scripted transport ran out of replies")))
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledTransport;

#[async_trait]
impl ResponsesTransport for StalledTransport {
    async fn create_response(&self, _: &ResponsesRequest) -> Result<ResponsesResponse> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(Error::protocol("stalled transport woke up"))
    }
}

/// Returns a fixed output and remembers every script it was given.
pub struct RecordingRunner {
    pub output: ScriptOutput,
    pub scripts: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn printing(stdout: &str) -> Arc<Self> {
        Arc::new(Self {
            output: ScriptOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: 0,
            },
            scripts: Mutex::new(Vec::new()),
        })
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptRunner for RecordingRunner {
    async fn run_inline(&self, script: &str) -> ScriptOutput {
        self.scripts.lock().unwrap().push(script.to_string());
        self.output.clone()
    }
}

pub fn text_response(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "output": [{
            "type": "message",
            "content": [{ "type": "output_text", "text": text }]
        }]
    })
}

pub fn call_response(id: Option<&str>, call_id: &str, name: &str, arguments: &str) -> Value {
    let mut body = json!({
        "output": [{
            "type": "function_call",
            "call_id": call_id,
            "name": name,
            "arguments": arguments
        }]
    });
    if let Some(id) = id {
        body["id"] = json!(id);
    }
    body
}

pub fn settings() -> Arc<RuntimeSettings> {
    Arc::new(RuntimeSettings::new(
        alicia_runtime::ProviderId::OpenAi,
        "gpt-5",
    ))
}

/// Builder wired to `transport` with the given tooling and a fixed base prompt.
pub fn builder(transport: Arc<ScriptedTransport>, tooling: ToolingConfig) -> ResponsesAssistantBuilder {
    ResponsesAssistant::builder()
        .transport(transport)
        .settings(settings())
        .tooling_config(tooling)
        .system_instructions("You are a test assistant.")
        .request_timeout(Duration::from_secs(30))
        .max_retries(2)
        .retry_base_delay(Duration::from_millis(300))
}
