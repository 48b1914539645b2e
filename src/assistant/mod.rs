//! Assistant front: the trait every backend implements plus the offline echo
//! assistant and the provider router.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::client::ResponsesAssistant;
use crate::settings::{ProviderId, RuntimeSettingsSource};
use crate::types::{AssistantRequest, MessageRole, Outcome};
use crate::Result;

pub const HELP_COMMAND: &str = "/help";
pub const LOCAL_HELP_SOURCE: &str = "local-help";
pub const LOCAL_ECHO_SOURCE: &str = "local-echo";
const RECENT_USER_MESSAGES: usize = 3;

/// Answers one caller turn.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn respond(&self, request: &AssistantRequest) -> Result<Outcome>;
}

#[async_trait]
impl Assistant for ResponsesAssistant {
    async fn respond(&self, request: &AssistantRequest) -> Result<Outcome> {
        ResponsesAssistant::respond(self, request).await
    }
}

/// Offline assistant: prints help or echoes the turn with the active settings.
pub struct LocalAssistant {
    settings: Arc<dyn RuntimeSettingsSource>,
}

impl LocalAssistant {
    pub fn new(settings: Arc<dyn RuntimeSettingsSource>) -> Self {
        Self { settings }
    }

    pub fn help_text() -> String {
        [
            "Commands:",
            "/help - show this help",
            "/settings - open the settings screen",
            "/skills - toggle local skills (ON/OFF)",
            "/py <script> - run inline Python",
            "Ctrl+C - quit",
        ]
        .join("\n")
    }
}

#[async_trait]
impl Assistant for LocalAssistant {
    async fn respond(&self, request: &AssistantRequest) -> Result<Outcome> {
        let settings = self.settings.snapshot();
        if request.message.trim() == HELP_COMMAND {
            return Ok(Outcome::plain(
                Self::help_text(),
                LOCAL_HELP_SOURCE,
                settings.model,
            ));
        }

        let user_messages: Vec<&str> = request
            .history
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect();
        let recent = user_messages[user_messages.len().saturating_sub(RECENT_USER_MESSAGES)..]
            .iter()
            .map(|m| format!("- {}", m))
            .collect::<Vec<_>>()
            .join("\n");

        let mut blocks = vec![
            "Alicia is running in local mode.".to_string(),
            format!("Current provider: {}", settings.provider),
            format!("Current model: {}", settings.model),
            format!("You sent: {}", request.message),
        ];
        if !recent.is_empty() {
            blocks.push(format!("Recent context:\n{}", recent));
        }

        Ok(Outcome::plain(
            blocks.join("\n\n"),
            LOCAL_ECHO_SOURCE,
            settings.model,
        ))
    }
}

/// Dispatches each turn to the assistant registered for the current provider.
///
/// Providers without a registered assistant, and the `/help` command, go to the
/// default assistant.
pub struct RoutedAssistant {
    settings: Arc<dyn RuntimeSettingsSource>,
    default_assistant: Arc<dyn Assistant>,
    assistants: HashMap<ProviderId, Arc<dyn Assistant>>,
}

impl RoutedAssistant {
    pub fn new(settings: Arc<dyn RuntimeSettingsSource>, default_assistant: Arc<dyn Assistant>) -> Self {
        Self {
            settings,
            default_assistant,
            assistants: HashMap::new(),
        }
    }

    pub fn route(mut self, provider: ProviderId, assistant: Arc<dyn Assistant>) -> Self {
        self.assistants.insert(provider, assistant);
        self
    }

    fn select(&self, request: &AssistantRequest) -> &Arc<dyn Assistant> {
        if request.message.trim() == HELP_COMMAND {
            return &self.default_assistant;
        }
        let provider = self.settings.snapshot().provider;
        debug!(provider = %provider, "routing assistant request");
        self.assistants
            .get(&provider)
            .unwrap_or(&self.default_assistant)
    }
}

#[async_trait]
impl Assistant for RoutedAssistant {
    async fn respond(&self, request: &AssistantRequest) -> Result<Outcome> {
        self.select(request).respond(request).await
    }
}
