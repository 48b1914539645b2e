//! Runtime settings snapshot consumed by assistants.
//!
//! Assistants read a fresh [`RuntimeSettings`] at the start of every turn through
//! [`RuntimeSettingsSource`]; nothing inside the driver keeps a global copy.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

pub const DEFAULT_LOCAL_MODEL: &str = "local-echo-v1";

/// Backend family the front end routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[default]
    Local,
    OpenAi,
    Codex,
    Anthropic,
    Google,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Local => "local",
            ProviderId::OpenAi => "openai",
            ProviderId::Codex => "codex",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Google => "google",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(ProviderId::Local),
            "openai" => Ok(ProviderId::OpenAi),
            "codex" => Ok(ProviderId::Codex),
            "anthropic" => Ok(ProviderId::Anthropic),
            "google" => Ok(ProviderId::Google),
            other => Err(crate::Error::configuration_with_context(
                format!("unknown provider '{}'", other),
                crate::ErrorContext::new().with_field_path("settings.provider"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    pub provider: ProviderId,
    pub model: String,
    #[serde(default)]
    pub enabled_skills: Vec<String>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            provider: ProviderId::Local,
            model: DEFAULT_LOCAL_MODEL.to_string(),
            enabled_skills: Vec::new(),
        }
    }
}

impl RuntimeSettings {
    pub fn new(provider: ProviderId, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            enabled_skills: Vec::new(),
        }
    }

    pub fn with_enabled_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    /// Trim skill names, drop empty ones and duplicates (first occurrence wins).
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.enabled_skills = self
            .enabled_skills
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        let model = self.model.trim();
        self.model = if model.is_empty() {
            DEFAULT_LOCAL_MODEL.to_string()
        } else {
            model.to_string()
        };
        self
    }
}

/// Where assistants read the current settings from.
pub trait RuntimeSettingsSource: Send + Sync {
    fn snapshot(&self) -> RuntimeSettings;
}

/// Settings held in memory; the persistent store lives outside this crate.
#[derive(Debug, Default)]
pub struct InMemoryRuntimeSettings {
    settings: RwLock<RuntimeSettings>,
}

impl InMemoryRuntimeSettings {
    pub fn new(initial: RuntimeSettings) -> Self {
        Self {
            settings: RwLock::new(initial.normalized()),
        }
    }

    pub fn set(&self, settings: RuntimeSettings) {
        let normalized = settings.normalized();
        match self.settings.write() {
            Ok(mut guard) => *guard = normalized,
            Err(poisoned) => *poisoned.into_inner() = normalized,
        }
    }
}

impl RuntimeSettingsSource for InMemoryRuntimeSettings {
    fn snapshot(&self) -> RuntimeSettings {
        match self.settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl RuntimeSettingsSource for RuntimeSettings {
    fn snapshot(&self) -> RuntimeSettings {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skills_are_trimmed_and_deduplicated() {
        let settings = InMemoryRuntimeSettings::new(
            RuntimeSettings::new(ProviderId::OpenAi, "gpt-5")
                .with_enabled_skills([" pdf ", "pdf", "", "csv"]),
        );
        assert_eq!(settings.snapshot().enabled_skills, vec!["pdf", "csv"]);
    }

    #[test]
    fn set_replaces_snapshot() {
        let settings = InMemoryRuntimeSettings::default();
        assert_eq!(settings.snapshot().provider, ProviderId::Local);
        settings.set(RuntimeSettings::new(ProviderId::OpenAi, " gpt-5.2 "));
        let snap = settings.snapshot();
        assert_eq!(snap.provider, ProviderId::OpenAi);
        assert_eq!(snap.model, "gpt-5.2");
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert!("mystery".parse::<ProviderId>().is_err());
    }
}
