//! Responses API client: the assistant that drives a conversation through
//! function calls, retries and capability fallback.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod conversation;
pub mod core;
pub mod error_classification;
pub mod policy;

pub use builder::ResponsesAssistantBuilder;
pub use conversation::{ContinuationMode, ConversationState};
pub use core::{ResponsesAssistant, DEFAULT_SYSTEM_INSTRUCTIONS, RESPONSES_SOURCE};
pub use policy::RetryPolicy;
