//! Wire types for the Responses API.
//!
//! Output items are parsed into closed enums right here; anything the driver does
//! not understand collapses into `Other` instead of failing the whole response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::tooling::ToolDescriptor;
use crate::types::message::MessageRole;
use crate::types::tool::FunctionCall;

/// Text returned when the service produced neither text nor an error message.
pub const NO_RESPONSE_TEXT: &str = "No response could be generated.";

/// Request body for `POST /responses`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    pub input: ResponseInput,
    pub instructions: String,
    pub parallel_tool_calls: bool,
    /// Omitted entirely when no tool is active; the API treats `[]` differently.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
}

impl ResponsesRequest {
    pub fn new(
        model: impl Into<String>,
        input: ResponseInput,
        instructions: impl Into<String>,
        tools: &[ToolDescriptor],
    ) -> Self {
        Self {
            model: model.into(),
            previous_response_id: None,
            input,
            instructions: instructions.into(),
            parallel_tool_calls: true,
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.to_vec())
            },
        }
    }

    pub fn with_previous_response_id(mut self, id: impl Into<String>) -> Self {
        self.previous_response_id = Some(id.into());
        self
    }

    pub fn tool_count(&self) -> usize {
        self.tools.as_ref().map(|t| t.len()).unwrap_or(0)
    }
}

/// `input` is either the serialized transcript or a list of typed items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseInput {
    Text(String),
    Items(Vec<InputItem>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message {
        role: MessageRole,
        content: String,
    },
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

impl InputItem {
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        InputItem::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }
}

impl From<&FunctionCall> for InputItem {
    fn from(call: &FunctionCall) -> Self {
        InputItem::FunctionCall {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            arguments: call.raw_arguments.clone(),
        }
    }
}

/// Response body of `POST /responses`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_output_items")]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub error: Option<ResponseError>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseError {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default, deserialize_with = "lenient_content_parts")]
        content: Vec<ContentPart>,
    },
    FunctionCall {
        #[serde(default)]
        call_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        arguments: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    OutputText {
        #[serde(default)]
        text: Option<String>,
    },
    Refusal {
        #[serde(default)]
        refusal: Option<String>,
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(other)]
    Other,
}

fn lenient_output_items<'de, D>(deserializer: D) -> std::result::Result<Vec<OutputItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap_or(OutputItem::Other))
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_content_parts<'de, D>(deserializer: D) -> std::result::Result<Vec<ContentPart>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(parts) => parts
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap_or(ContentPart::Other))
            .collect(),
        _ => Vec::new(),
    })
}

impl ResponsesResponse {
    /// Pending function calls, skipping items without a call id or name.
    pub fn function_calls(&self) -> Vec<FunctionCall> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::FunctionCall {
                    call_id,
                    name,
                    arguments,
                } => {
                    let call_id = call_id.as_deref().map(str::trim).unwrap_or("");
                    let name = name.as_deref().map(str::trim).unwrap_or("");
                    if call_id.is_empty() || name.is_empty() {
                        return None;
                    }
                    Some(FunctionCall::new(
                        call_id,
                        name,
                        arguments.clone().unwrap_or_else(|| "{}".to_string()),
                    ))
                }
                _ => None,
            })
            .collect()
    }

    /// Text and refusal fragments of every message item, trimmed and non-empty.
    pub fn text_fragments(&self) -> Vec<String> {
        let mut texts = Vec::new();
        for item in &self.output {
            let OutputItem::Message { content } = item else {
                continue;
            };
            for part in content {
                let fragment = match part {
                    ContentPart::OutputText { text } => text.as_deref(),
                    ContentPart::Refusal { refusal, text } => refusal.as_deref().or(text.as_deref()),
                    ContentPart::Other => None,
                };
                if let Some(fragment) = fragment.map(str::trim).filter(|s| !s.is_empty()) {
                    texts.push(fragment.to_string());
                }
            }
        }
        texts
    }

    /// Final user-facing text: fragments, else the reported error, else a fixed marker.
    pub fn final_text(&self) -> String {
        let texts = self.text_fragments();
        if !texts.is_empty() {
            return texts.join("\n\n");
        }

        if let Some(message) = self
            .error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
        {
            return message.to_string();
        }

        NO_RESPONSE_TEXT.to_string()
    }
}
