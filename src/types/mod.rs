//! Core data types: chat transcript, Responses API wire items and turn outcomes.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatMessage`] | Transcript entry with role and content |
//! | [`AssistantRequest`] | One caller turn (history + system patches) |
//! | [`ResponsesRequest`] / [`ResponsesResponse`] | Wire request and parsed response |
//! | [`FunctionCall`] | Function call requested by the model |
//! | [`Outcome`] | Final text plus tooling metadata |

pub mod message;
pub mod outcome;
pub mod response;
pub mod tool;

pub use message::{AssistantRequest, ChatMessage, MessageRole};
pub use outcome::{Outcome, OutcomeMetadata, ToolFallback};
pub use response::{
    ContentPart, InputItem, OutputItem, ResponseInput, ResponsesRequest, ResponsesResponse,
};
pub use tool::FunctionCall;
