//! Function-call turn loop for one tooling level.
//!
//! A conversation starts with the serialized transcript, then keeps answering
//! the model's function calls until a response arrives without any. Every
//! request (initial or continuation) goes through the retry policy and the
//! per-request timeout independently.

use std::time::Duration;
use tracing::{debug, info};

use crate::client::policy::RetryPolicy;
use crate::tooling::ToolSet;
use crate::transport::ResponsesTransport;
use crate::types::{
    InputItem, MessageRole, ResponseInput, ResponsesRequest, ResponsesResponse, ToolFallback,
};
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_MAX_TURNS: u32 = 8;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);

/// How continuation requests refer back to earlier turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuationMode {
    /// Send only the new function outputs plus `previous_response_id`.
    #[default]
    PreviousResponseId,
    /// Resend the user input, every function call and every output as input
    /// items. For endpoints that keep no server-side response state.
    FullTranscript,
}

/// Progress of a conversation at one tooling level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationState {
    /// Id of the most recent response, when the service sent one.
    pub response_id: Option<String>,
    /// Follow-up requests sent so far.
    pub turn: u32,
    pub fallback: ToolFallback,
}

/// Final response of a conversation and the state it finished in.
#[derive(Debug, Clone)]
pub struct ConversationResult {
    pub response: ResponsesResponse,
    pub state: ConversationState,
}

/// Per-turn request parameters shared by every request of a conversation.
#[derive(Debug, Clone, Copy)]
pub struct ConversationRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
    pub instructions: &'a str,
    pub tool_set: &'a ToolSet,
    pub fallback: ToolFallback,
}

/// Runs the turn loop against a transport.
pub struct Conversation<'a> {
    transport: &'a dyn ResponsesTransport,
    retry: RetryPolicy,
    request_timeout: Duration,
    max_turns: u32,
    mode: ContinuationMode,
}

impl<'a> Conversation<'a> {
    pub fn new(transport: &'a dyn ResponsesTransport) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_turns: DEFAULT_MAX_TURNS,
            mode: ContinuationMode::default(),
        }
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn mode(mut self, mode: ContinuationMode) -> Self {
        self.mode = mode;
        self
    }

    pub async fn run(&self, req: ConversationRequest<'_>) -> Result<ConversationResult> {
        let tools = &req.tool_set.tools;
        let initial = ResponsesRequest::new(
            req.model,
            ResponseInput::Text(req.input.to_string()),
            req.instructions,
            tools,
        );

        let mut response = self.send(&initial).await?;
        let mut state = ConversationState {
            response_id: response.id.clone(),
            turn: 0,
            fallback: req.fallback,
        };
        let mut transcript = vec![InputItem::Message {
            role: MessageRole::User,
            content: req.input.to_string(),
        }];

        loop {
            let calls = response.function_calls();
            if calls.is_empty() {
                return Ok(ConversationResult { response, state });
            }

            let previous_id = response
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            if self.mode == ContinuationMode::PreviousResponseId && previous_id.is_none() {
                return Err(Error::protocol_with_context(
                    "response carries function calls but no id; cannot continue",
                    ErrorContext::new()
                        .with_field_path("response.id")
                        .with_source("conversation_loop"),
                ));
            }
            if state.turn >= self.max_turns {
                return Err(Error::TurnLimitExceeded {
                    max_turns: self.max_turns,
                });
            }

            info!(
                turn = state.turn + 1,
                calls = calls.len(),
                fallback = %state.fallback,
                "executing function calls"
            );
            let outputs = req.tool_set.executor.execute_all(&calls).await;

            let continuation = match (self.mode, previous_id) {
                (ContinuationMode::PreviousResponseId, Some(id)) => {
                    ResponsesRequest::new(req.model, ResponseInput::Items(outputs), req.instructions, tools)
                        .with_previous_response_id(id)
                }
                _ => {
                    transcript.extend(calls.iter().map(InputItem::from));
                    transcript.extend(outputs);
                    ResponsesRequest::new(
                        req.model,
                        ResponseInput::Items(transcript.clone()),
                        req.instructions,
                        tools,
                    )
                }
            };

            response = self.send(&continuation).await?;
            state.turn += 1;
            state.response_id = response.id.clone();
        }
    }

    /// One request under retry, each attempt bounded by the request timeout.
    async fn send(&self, request: &ResponsesRequest) -> Result<ResponsesResponse> {
        let timeout = self.request_timeout;
        self.retry
            .run(move || async move {
                debug!(
                    tools = request.tool_count(),
                    continuation = request.previous_response_id.is_some(),
                    "Responses request attempt"
                );
                match tokio::time::timeout(timeout, self.transport.create_response(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                }
            })
            .await
    }
}
