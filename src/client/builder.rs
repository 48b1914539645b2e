use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::conversation::{ContinuationMode, DEFAULT_MAX_TURNS, DEFAULT_REQUEST_TIMEOUT};
use crate::client::core::{
    ResponsesAssistant, DEFAULT_MAX_HISTORY_MESSAGES, DEFAULT_SYSTEM_INSTRUCTIONS,
};
use crate::client::policy::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};
use crate::persona::PersonaLoader;
use crate::settings::{InMemoryRuntimeSettings, RuntimeSettingsSource};
use crate::tooling::{ScriptRunner, ToolSetBuilder, ToolingConfig, ToolingConfigResolver};
use crate::transport::{HttpTransport, ResponsesTransport};
use crate::Result;

/// Builder for [`ResponsesAssistant`].
///
/// Explicit settings win over environment variables, which win over defaults:
/// - `ALICIA_OPENAI_TIMEOUT_MS` (default 30000)
/// - `ALICIA_OPENAI_MAX_RETRIES` (default 2)
/// - `ALICIA_OPENAI_MAX_TURNS` (default 8, at least 1)
/// - `ALICIA_OPENAI_MAX_HISTORY_MESSAGES` (default 12, at least 1)
///
/// Base instructions come from [`system_instructions`](Self::system_instructions), else
/// from the persona layers of the workspace root, else [`DEFAULT_SYSTEM_INSTRUCTIONS`].
pub struct ResponsesAssistantBuilder {
    transport: Option<Arc<dyn ResponsesTransport>>,
    settings: Option<Arc<dyn RuntimeSettingsSource>>,
    tooling: Option<ToolingConfig>,
    workspace_root: Option<PathBuf>,
    tool_builder: ToolSetBuilder,
    max_retries: Option<u32>,
    base_delay: Duration,
    request_timeout: Option<Duration>,
    max_turns: Option<u32>,
    max_history_messages: Option<usize>,
    system_instructions: Option<String>,
    extra_instructions: Option<String>,
    persona: Option<PersonaLoader>,
    continuation: ContinuationMode,
}

impl ResponsesAssistantBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            settings: None,
            tooling: None,
            workspace_root: None,
            tool_builder: ToolSetBuilder::new(),
            max_retries: None,
            base_delay: DEFAULT_BASE_DELAY,
            request_timeout: None,
            max_turns: None,
            max_history_messages: None,
            system_instructions: None,
            extra_instructions: None,
            persona: None,
            continuation: ContinuationMode::default(),
        }
    }

    /// Transport to use. Defaults to [`HttpTransport::from_env`].
    pub fn transport(mut self, transport: Arc<dyn ResponsesTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Settings source read at the start of every turn.
    pub fn settings(mut self, settings: Arc<dyn RuntimeSettingsSource>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Tooling configuration. Defaults to resolving the environment against the workspace root.
    pub fn tooling_config(mut self, config: ToolingConfig) -> Self {
        self.tooling = Some(config);
        self
    }

    pub fn workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn tool_set_builder(mut self, builder: ToolSetBuilder) -> Self {
        self.tool_builder = builder;
        self
    }

    /// Shortcut for injecting the runner behind `run_python_inline`.
    pub fn script_runner(mut self, runner: Arc<dyn ScriptRunner>) -> Self {
        self.tool_builder = self.tool_builder.with_script_runner(runner);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns.max(1));
        self
    }

    pub fn max_history_messages(mut self, n: usize) -> Self {
        self.max_history_messages = Some(n.max(1));
        self
    }

    /// Replace the base instructions entirely.
    pub fn system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = Some(instructions.into());
        self
    }

    /// Put caller instructions in front of the base instructions.
    pub fn extra_instructions(mut self, instructions: &str) -> Self {
        let trimmed = instructions.trim();
        self.extra_instructions = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Persona loader to use instead of one over the workspace root.
    pub fn persona_loader(mut self, loader: PersonaLoader) -> Self {
        self.persona = Some(loader);
        self
    }

    pub fn continuation_mode(mut self, mode: ContinuationMode) -> Self {
        self.continuation = mode;
        self
    }

    pub fn build(self) -> Result<ResponsesAssistant> {
        let request_timeout = self.request_timeout.unwrap_or_else(|| {
            env_u64("ALICIA_OPENAI_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
        });
        let max_retries = self.max_retries.unwrap_or_else(|| {
            env_u64("ALICIA_OPENAI_MAX_RETRIES")
                .map(|n| n.min(u32::MAX as u64) as u32)
                .unwrap_or(DEFAULT_MAX_RETRIES)
        });
        let max_turns = self.max_turns.unwrap_or_else(|| {
            env_u64("ALICIA_OPENAI_MAX_TURNS")
                .map(|n| n.clamp(1, u32::MAX as u64) as u32)
                .unwrap_or(DEFAULT_MAX_TURNS)
        });
        let max_history_messages = self.max_history_messages.unwrap_or_else(|| {
            env_u64("ALICIA_OPENAI_MAX_HISTORY_MESSAGES")
                .map(|n| n.max(1) as usize)
                .unwrap_or(DEFAULT_MAX_HISTORY_MESSAGES)
        });

        let base_instructions = match self.system_instructions {
            Some(instructions) => instructions,
            None => {
                let persona = match (self.persona, &self.workspace_root) {
                    (Some(loader), _) => loader.load_instructions_if_present()?,
                    (None, Some(root)) => PersonaLoader::new(root).load_instructions_if_present()?,
                    (None, None) => None,
                };
                persona.unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTIONS.to_string())
            }
        };
        let system_instructions = match self.extra_instructions {
            Some(extra) => format!("{}\n\n{}", extra, base_instructions),
            None => base_instructions,
        };

        let transport: Arc<dyn ResponsesTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::from_env()?.with_timeout(request_timeout)),
        };
        let settings: Arc<dyn RuntimeSettingsSource> = match self.settings {
            Some(s) => s,
            None => Arc::new(InMemoryRuntimeSettings::default()),
        };
        let tooling = match self.tooling {
            Some(config) => config,
            None => {
                let root = match self.workspace_root {
                    Some(root) => root,
                    None => env::current_dir()?,
                };
                ToolingConfigResolver::new(root).resolve()
            }
        };

        Ok(ResponsesAssistant {
            transport,
            settings,
            tooling,
            tool_builder: self.tool_builder,
            retry: RetryPolicy::new(max_retries, self.base_delay),
            request_timeout,
            max_turns,
            max_history_messages,
            system_instructions,
            continuation: self.continuation,
        })
    }
}

impl Default for ResponsesAssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.trim().parse::<u64>().ok())
}
