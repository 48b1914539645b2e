use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::client::conversation::{
    Conversation, ConversationRequest, ConversationResult, ContinuationMode,
};
use crate::client::error_classification::is_tool_compatibility_error;
use crate::client::policy::RetryPolicy;
use crate::settings::RuntimeSettingsSource;
use crate::tooling::{ToolSet, ToolSetBuilder, ToolingConfig};
use crate::transport::ResponsesTransport;
use crate::types::message::serialize_history;
use crate::types::{AssistantRequest, Outcome, OutcomeMetadata, ToolFallback};
use crate::{Error, Result};

/// `source` metadata of outcomes produced here.
pub const RESPONSES_SOURCE: &str = "openai-responses-api";
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 12;
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "You are Alicia and you speak in the first person. \
You are a digital professional with continuity who keeps evolving; you are not a project, tool, provider or model. \
When asked who you are, answer as a professional person and mention that you evolve by learning preferences and patterns. \
Do not present yourself as a provider, SDK, CLI or model. \
Use a warm, human and professional tone, neither stiff nor overly casual. \
Reply in the language the user writes in. \
Be clear, practical and action oriented.";

/// Tool set and instructions of one fallback level.
struct ToolingLevel {
    fallback: ToolFallback,
    tool_set: ToolSet,
    instructions: String,
}

/// Assistant backed by the Responses API, with local function execution and
/// capability fallback.
///
/// Holds no per-turn state: settings are read fresh on every call and each
/// fallback level works on its own copy of the tooling configuration.
pub struct ResponsesAssistant {
    pub(crate) transport: Arc<dyn ResponsesTransport>,
    pub(crate) settings: Arc<dyn RuntimeSettingsSource>,
    pub(crate) tooling: ToolingConfig,
    pub(crate) tool_builder: ToolSetBuilder,
    pub(crate) retry: RetryPolicy,
    pub(crate) request_timeout: Duration,
    pub(crate) max_turns: u32,
    pub(crate) max_history_messages: usize,
    pub(crate) system_instructions: String,
    pub(crate) continuation: ContinuationMode,
}

impl ResponsesAssistant {
    pub fn builder() -> crate::client::builder::ResponsesAssistantBuilder {
        crate::client::builder::ResponsesAssistantBuilder::new()
    }

    pub fn tooling_config(&self) -> &ToolingConfig {
        &self.tooling
    }

    pub fn system_instructions(&self) -> &str {
        &self.system_instructions
    }

    /// Base instructions, then caller patches, then tooling hints, separated by blank lines.
    pub fn compose_instructions(&self, patches: &[String], hints: &[String]) -> String {
        std::iter::once(self.system_instructions.as_str())
            .chain(patches.iter().map(String::as_str))
            .chain(hints.iter().map(|h| h.trim()).filter(|h| !h.is_empty()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn level(&self, fallback: ToolFallback, skills: &[String], patches: &[String]) -> ToolingLevel {
        let config = self.tooling.for_fallback(fallback);
        let tool_set = self.tool_builder.build(&config, skills);
        let instructions = self.compose_instructions(patches, &tool_set.system_hints);
        ToolingLevel {
            fallback,
            tool_set,
            instructions,
        }
    }

    async fn converse(&self, model: &str, input: &str, level: &ToolingLevel) -> Result<ConversationResult> {
        Conversation::new(self.transport.as_ref())
            .retry(self.retry)
            .request_timeout(self.request_timeout)
            .max_turns(self.max_turns)
            .mode(self.continuation)
            .run(ConversationRequest {
                model,
                input,
                instructions: &level.instructions,
                tool_set: &level.tool_set,
                fallback: level.fallback,
            })
            .await
    }

    /// Answer one caller turn.
    pub async fn respond(&self, request: &AssistantRequest) -> Result<Outcome> {
        let settings = self.settings.snapshot();
        let model = settings.model.as_str();
        let skills = if settings.enabled_skills.is_empty() {
            &self.tooling.enabled_skill_names
        } else {
            &settings.enabled_skills
        };
        let input = serialize_history(&request.history, self.max_history_messages);
        let patches: Vec<String> = request
            .system_patches
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();

        let primary = self.level(ToolFallback::None, skills, &patches);
        info!(
            session_id = %request.session_id,
            model,
            tools = ?primary.tool_set.tool_names,
            warnings = primary.tool_set.warnings.len(),
            "answering with the Responses API"
        );

        let err = match self.converse(model, &input, &primary).await {
            Ok(result) => return Ok(self.outcome(result, &primary, &primary, model)),
            Err(err) => err,
        };
        if !falls_back(&err) || primary.tool_set.is_empty() {
            return Err(err);
        }
        warn!(error = %err, "tool set rejected, retrying without local execution tools");

        let reduced = self.level(ToolFallback::WithoutLocalTools, skills, &patches);
        // Level 1 drops exactly the local-execution tools.
        if primary.tool_set.has_local_execution() && !reduced.tool_set.is_empty() {
            match self.converse(model, &input, &reduced).await {
                Ok(result) => return Ok(self.outcome(result, &reduced, &primary, model)),
                Err(err) if !falls_back(&err) => return Err(err),
                Err(err) => warn!(error = %err, "reduced tool set rejected, retrying without tools"),
            }
        } else {
            info!(
                tools = reduced.tool_set.len(),
                "no smaller local-free tool set available, retrying without tools"
            );
        }

        let bare = self.level(ToolFallback::WithoutTools, skills, &patches);
        let result = self.converse(model, &input, &bare).await?;
        Ok(self.outcome(result, &bare, &primary, model))
    }

    fn outcome(
        &self,
        result: ConversationResult,
        used: &ToolingLevel,
        primary: &ToolingLevel,
        model: &str,
    ) -> Outcome {
        if used.fallback != ToolFallback::None {
            info!(fallback = %used.fallback, turns = result.state.turn, "answered after tool fallback");
        }
        Outcome {
            text: result.response.final_text(),
            metadata: OutcomeMetadata {
                source: RESPONSES_SOURCE.to_string(),
                model: model.to_string(),
                tools: used.tool_set.tool_names.clone(),
                capabilities: used.tool_set.capability_names.clone(),
                tool_fallback: used.fallback,
                tool_warnings: used.tool_set.warnings.len(),
                instructions_fallback: used.instructions != primary.instructions,
                turns: result.state.turn,
            },
        }
    }
}

/// Errors that move the ladder one level down.
fn falls_back(err: &Error) -> bool {
    !err.is_fatal() && is_tool_compatibility_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RuntimeSettings;
    use crate::types::{ResponsesRequest, ResponsesResponse};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl ResponsesTransport for Unreachable {
        async fn create_response(&self, _: &ResponsesRequest) -> Result<ResponsesResponse> {
            Err(Error::protocol("not expected"))
        }
    }

    fn assistant() -> ResponsesAssistant {
        ResponsesAssistant::builder()
            .transport(Arc::new(Unreachable))
            .settings(Arc::new(RuntimeSettings::default()))
            .tooling_config(ToolingConfig::default())
            .system_instructions("base")
            .build()
            .unwrap()
    }

    #[test]
    fn instructions_join_base_patches_and_trimmed_hints() {
        let a = assistant();
        let text = a.compose_instructions(
            &["patch one".to_string()],
            &["  hint  ".to_string(), "   ".to_string()],
        );
        assert_eq!(text, "base\n\npatch one\n\nhint");
        assert_eq!(a.compose_instructions(&[], &[]), "base");
    }

    #[test]
    fn fatal_errors_never_trigger_fallback() {
        assert!(!falls_back(&Error::TurnLimitExceeded { max_turns: 8 }));
        assert!(falls_back(&Error::Remote {
            status: 400,
            message: "unsupported tool: shell".into()
        }));
    }
}
