//! Tool descriptors sent in the `tools` array of a Responses request

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Approval policy forwarded to a remote MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum McpApproval {
    #[default]
    Never,
    Always,
}

impl McpApproval {
    /// Anything other than `always` means `never`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("always") {
            McpApproval::Always
        } else {
            McpApproval::Never
        }
    }
}

/// Execution container for hosted tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(rename = "type")]
    pub container_type: String,
}

impl Container {
    pub fn auto() -> Self {
        Self {
            container_type: "auto".to_string(),
        }
    }
}

/// One entry of the `tools` array. Each variant carries only what its kind needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDescriptor {
    WebSearch,
    FileSearch {
        vector_store_ids: Vec<String>,
    },
    CodeInterpreter {
        container: Container,
    },
    ImageGeneration,
    Mcp {
        server_label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        server_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connector_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization: Option<String>,
        require_approval: McpApproval,
    },
    Shell {
        container: Container,
    },
    ApplyPatch,
    ComputerUsePreview {
        display_width: u32,
        display_height: u32,
        environment: String,
    },
    Function {
        name: String,
        description: String,
        strict: bool,
        parameters: Value,
    },
}

impl ToolDescriptor {
    /// Wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolDescriptor::WebSearch => "web_search",
            ToolDescriptor::FileSearch { .. } => "file_search",
            ToolDescriptor::CodeInterpreter { .. } => "code_interpreter",
            ToolDescriptor::ImageGeneration => "image_generation",
            ToolDescriptor::Mcp { .. } => "mcp",
            ToolDescriptor::Shell { .. } => "shell",
            ToolDescriptor::ApplyPatch => "apply_patch",
            ToolDescriptor::ComputerUsePreview { .. } => "computer_use_preview",
            ToolDescriptor::Function { .. } => "function",
        }
    }

    /// Display name: the declared name for named tools, the kind tag otherwise.
    pub fn name(&self) -> &str {
        match self {
            ToolDescriptor::Function { name, .. } if !name.trim().is_empty() => name,
            other => other.kind(),
        }
    }

    /// Tools that act on the local machine and are dropped at fallback level 1.
    pub fn is_local_execution(&self) -> bool {
        matches!(
            self,
            ToolDescriptor::Shell { .. }
                | ToolDescriptor::ApplyPatch
                | ToolDescriptor::ComputerUsePreview { .. }
        )
    }

    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        ToolDescriptor::Function {
            name: name.into(),
            description: description.into(),
            strict: true,
            parameters,
        }
    }
}

impl fmt::Display for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hosted_tools_serialize_with_type_tag() {
        assert_eq!(
            serde_json::to_value(ToolDescriptor::WebSearch).unwrap(),
            json!({"type": "web_search"})
        );
        assert_eq!(
            serde_json::to_value(ToolDescriptor::Shell {
                container: Container::auto()
            })
            .unwrap(),
            json!({"type": "shell", "container": {"type": "auto"}})
        );
        assert_eq!(
            serde_json::to_value(ToolDescriptor::ComputerUsePreview {
                display_width: 1440,
                display_height: 900,
                environment: "browser".into(),
            })
            .unwrap(),
            json!({"type": "computer_use_preview", "display_width": 1440, "display_height": 900, "environment": "browser"})
        );
    }

    #[test]
    fn mcp_omits_absent_endpoint_fields() {
        let tool = ToolDescriptor::Mcp {
            server_label: "alicia-mcp".into(),
            server_url: None,
            connector_id: Some("connector_gmail".into()),
            authorization: None,
            require_approval: McpApproval::Never,
        };
        assert_eq!(
            serde_json::to_value(&tool).unwrap(),
            json!({
                "type": "mcp",
                "server_label": "alicia-mcp",
                "connector_id": "connector_gmail",
                "require_approval": "never"
            })
        );
    }

    #[test]
    fn names_fall_back_to_kind() {
        let f = ToolDescriptor::function("run_python_inline", "d", json!({}));
        assert_eq!(f.name(), "run_python_inline");
        assert_eq!(f.kind(), "function");
        let unnamed = ToolDescriptor::function("  ", "d", json!({}));
        assert_eq!(unnamed.name(), "function");
        assert_eq!(ToolDescriptor::ApplyPatch.name(), "apply_patch");
    }

    #[test]
    fn local_execution_classification() {
        assert!(ToolDescriptor::ApplyPatch.is_local_execution());
        assert!(!ToolDescriptor::WebSearch.is_local_execution());
        assert!(!ToolDescriptor::ImageGeneration.is_local_execution());
    }

    #[test]
    fn approval_parsing_defaults_to_never() {
        assert_eq!(McpApproval::parse(" ALWAYS "), McpApproval::Always);
        assert_eq!(McpApproval::parse("sometimes"), McpApproval::Never);
    }
}
