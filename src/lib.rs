//! # alicia-runtime
//!
//! Conversation runtime for a tool-using assistant on top of the OpenAI
//! Responses API.
//!
//! ## Overview
//!
//! One caller turn becomes one conversation: the recent transcript is sent with
//! the configured tool set, function calls requested by the model are executed
//! locally and fed back, and the loop ends on the first response that carries
//! no function call. Transient failures are retried per request; when the
//! service rejects the tool set, the turn is replayed with fewer capabilities.
//!
//! ## Key Features
//!
//! - **Tooling**: hosted tools (web search, file search, code interpreter, image
//!   generation, MCP, shell, apply_patch, computer use) and local function tools,
//!   configured from the environment via [`tooling::ToolingConfigResolver`]
//! - **Function calls**: concurrent local execution with the built-in
//!   `run_python_inline` function
//! - **Resilience**: per-request exponential backoff and a three-level capability
//!   fallback ladder
//! - **Skills**: local `SKILL.md` catalogs advertised to the model through the
//!   instructions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alicia_runtime::{AssistantRequest, ResponsesAssistant};
//!
//! #[tokio::main]
//! async fn main() -> alicia_runtime::Result<()> {
//!     let assistant = ResponsesAssistant::builder()
//!         .workspace_root(".")
//!         .build()?;
//!
//!     let outcome = assistant
//!         .respond(&AssistantRequest::new("session-1", "What is 2 + 2?"))
//!         .await?;
//!     println!("{}", outcome.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Responses assistant, turn loop, retry policy and fallback |
//! | [`tooling`] | Tool configuration, tool set building and function execution |
//! | [`transport`] | Transport seam and the reqwest HTTP implementation |
//! | [`types`] | Transcript, wire and outcome types |
//! | [`assistant`] | Assistant trait, local echo assistant and provider router |
//! | [`skills`] | Local skill discovery |
//! | [`persona`] | Layered persona instructions loaded from the workspace |
//! | [`settings`] | Runtime settings snapshots |

pub mod assistant;
pub mod client;
pub mod persona;
pub mod settings;
pub mod skills;
pub mod tooling;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use assistant::{Assistant, LocalAssistant, RoutedAssistant};
pub use persona::{PersonaLayer, PersonaLoader};
pub use client::{ContinuationMode, ResponsesAssistant, ResponsesAssistantBuilder, RetryPolicy};
pub use settings::{InMemoryRuntimeSettings, ProviderId, RuntimeSettings, RuntimeSettingsSource};
pub use tooling::{ToolDescriptor, ToolSet, ToolSetBuilder, ToolingConfig, ToolingConfigResolver};
pub use transport::{HttpTransport, ResponsesTransport};
pub use types::{
    AssistantRequest, ChatMessage, FunctionCall, MessageRole, Outcome, OutcomeMetadata,
    ToolFallback,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
