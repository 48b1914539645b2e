//! Result of one caller turn

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Capability reduction in effect when the turn completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolFallback {
    /// Level 0: full configuration.
    #[default]
    None,
    /// Level 1: shell, apply_patch, computer use and skills removed.
    WithoutLocalTools,
    /// Level 2: every capability removed.
    WithoutTools,
}

impl ToolFallback {
    pub fn level(&self) -> u8 {
        match self {
            ToolFallback::None => 0,
            ToolFallback::WithoutLocalTools => 1,
            ToolFallback::WithoutTools => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolFallback::None => "none",
            ToolFallback::WithoutLocalTools => "without-local-tools",
            ToolFallback::WithoutTools => "without-tools",
        }
    }
}

impl fmt::Display for ToolFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeMetadata {
    pub source: String,
    pub model: String,
    pub tools: Vec<String>,
    pub capabilities: Vec<String>,
    pub tool_fallback: ToolFallback,
    pub tool_warnings: usize,
    /// Instructions sent differ from the level 0 instructions. Informational only.
    pub instructions_fallback: bool,
    /// Function-call rounds completed after the initial request.
    pub turns: u32,
}

impl OutcomeMetadata {
    /// Flat string map consumed by the chat front end.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let join = |items: &[String]| {
            if items.is_empty() {
                "none".to_string()
            } else {
                items.join(",")
            }
        };

        let mut map = BTreeMap::new();
        map.insert("source".to_string(), self.source.clone());
        map.insert("model".to_string(), self.model.clone());
        map.insert("tools".to_string(), join(&self.tools));
        map.insert("capabilities".to_string(), join(&self.capabilities));
        map.insert("toolFallback".to_string(), self.tool_fallback.to_string());
        map.insert("toolWarnings".to_string(), self.tool_warnings.to_string());
        map.insert("turns".to_string(), self.turns.to_string());
        if self.instructions_fallback {
            map.insert("instructionsFallback".to_string(), "true".to_string());
        }
        map
    }
}

/// Final answer of an assistant for one caller turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub text: String,
    pub metadata: OutcomeMetadata,
}

impl Outcome {
    /// Outcome with no tooling involved (local and routed assistants).
    pub fn plain(text: impl Into<String>, source: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: OutcomeMetadata {
                source: source.into(),
                model: model.into(),
                tools: Vec::new(),
                capabilities: Vec::new(),
                tool_fallback: ToolFallback::None,
                tool_warnings: 0,
                instructions_fallback: false,
                turns: 0,
            },
        }
    }
}
