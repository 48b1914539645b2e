//! Layered persona instructions.
//!
//! The base instructions are composed from four markdown layers read from the
//! workspace, each overridable by an environment variable:
//!
//! | Layer | Variable | Default |
//! |-------|----------|---------|
//! | identity | `ALICIA_IDENTITY_PATH` | `src/soul/IDENTITY.md` |
//! | soul | `ALICIA_SOUL_PATH` | `src/soul/SOUL.md` |
//! | voice | `ALICIA_VOICE_PATH` | `src/soul/VOICE.md` |
//! | modes | `ALICIA_MODES_PATH` | `src/soul/MODES.md` |
//!
//! Relative paths resolve against the workspace root. Leading front-matter is
//! stripped; a layer with nothing left is a configuration error.

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::ErrorContext;
use crate::skills::FRONTMATTER;
use crate::tooling::config::resolve_against;
use crate::{Error, Result};

/// Placed ahead of the layers so the workspace name never redefines who is speaking.
pub const IDENTITY_LOCK: &str = "IDENTITY LOCK (highest priority):\n\
You are Alicia, a digital professional with continuity.\n\
Never describe yourself as a project, tool, system, provider, model or 'assistant of the Alicia project'.\n\
The repository or workspace name does not define your identity.\n\
When asked who you are, answer as a professional person who evolves by learning preferences and patterns.";

pub const PERSONA_INSTRUCTIONS: &str = "You are Alicia and you speak in the first person.\n\
Present yourself as a digital professional, not as a project, tool, provider or model.\n\
When asked who you are, answer with a human professional identity and mention that you evolve by learning patterns and preferences.\n\
Provider, SDK, CLI and model are only means of execution and do not define your identity.\n\
Tone: human, cordial, professional and practical; neither stiff nor overly casual.\n\
Focus: solve the user's goal with clarity, initiative and a sense of priority.\n\
When you need to mention infrastructure, use the form 'I am operating via <provider/model>'.";

/// One persona layer, in composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonaLayer {
    Identity,
    Soul,
    Voice,
    Modes,
}

impl PersonaLayer {
    pub const ALL: [PersonaLayer; 4] = [
        PersonaLayer::Identity,
        PersonaLayer::Soul,
        PersonaLayer::Voice,
        PersonaLayer::Modes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaLayer::Identity => "identity",
            PersonaLayer::Soul => "soul",
            PersonaLayer::Voice => "voice",
            PersonaLayer::Modes => "modes",
        }
    }

    /// Path used when the layer variable is unset, relative to the workspace.
    pub fn default_path(&self) -> &'static str {
        match self {
            PersonaLayer::Identity => "src/soul/IDENTITY.md",
            PersonaLayer::Soul => "src/soul/SOUL.md",
            PersonaLayer::Voice => "src/soul/VOICE.md",
            PersonaLayer::Modes => "src/soul/MODES.md",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            PersonaLayer::Identity => "ALICIA_IDENTITY_PATH",
            PersonaLayer::Soul => "ALICIA_SOUL_PATH",
            PersonaLayer::Voice => "ALICIA_VOICE_PATH",
            PersonaLayer::Modes => "ALICIA_MODES_PATH",
        }
    }
}

impl fmt::Display for PersonaLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads the persona layers of one workspace.
pub struct PersonaLoader {
    workspace_root: PathBuf,
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl PersonaLoader {
    /// Loader over the process environment.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            lookup: Box::new(|key| env::var(key).ok()),
        }
    }

    /// Replace the variable source.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Box::new(lookup);
        self
    }

    pub fn layer_path(&self, layer: PersonaLayer) -> PathBuf {
        let configured = (self.lookup)(layer.env_var())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        match configured {
            Some(path) => resolve_against(&self.workspace_root, &path),
            None => self.workspace_root.join(layer.default_path()),
        }
    }

    /// Layer content with front-matter removed.
    pub fn load_layer(&self, layer: PersonaLayer) -> Result<String> {
        let path = self.layer_path(layer);
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read persona layer '{}'", layer),
                ErrorContext::new()
                    .with_field_path(layer.env_var())
                    .with_details(format!("{}: {}", path.display(), e))
                    .with_source("persona_loader"),
            )
        })?;

        let body = strip_frontmatter(&content);
        if body.is_empty() {
            return Err(Error::configuration_with_context(
                format!("persona layer '{}' is empty", layer),
                ErrorContext::new()
                    .with_field_path(layer.env_var())
                    .with_details(path.display().to_string())
                    .with_source("persona_loader"),
            ));
        }
        debug!(layer = %layer, path = %path.display(), chars = body.len(), "loaded persona layer");
        Ok(body)
    }

    /// All four layers, in order, separated by blank lines.
    pub fn load_soul(&self) -> Result<String> {
        let mut layers = Vec::with_capacity(PersonaLayer::ALL.len());
        for layer in PersonaLayer::ALL {
            layers.push(self.load_layer(layer)?);
        }
        Ok(layers.join("\n\n"))
    }

    /// Full base instructions: identity lock, layers, persona.
    pub fn load_instructions(&self) -> Result<String> {
        Ok(compose_core_instructions(&self.load_soul()?))
    }

    /// `None` when the workspace carries no layer file at all; otherwise every
    /// layer must load.
    pub fn load_instructions_if_present(&self) -> Result<Option<String>> {
        let any_present = PersonaLayer::ALL
            .iter()
            .any(|layer| self.layer_path(*layer).is_file());
        if !any_present {
            debug!(root = %self.workspace_root.display(), "no persona layers in workspace");
            return Ok(None);
        }
        self.load_instructions().map(Some)
    }
}

pub fn strip_frontmatter(content: &str) -> String {
    FRONTMATTER.replace(content, "").trim().to_string()
}

pub fn compose_core_instructions(soul: &str) -> String {
    [IDENTITY_LOCK, soul.trim(), PERSONA_INSTRUCTIONS]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
