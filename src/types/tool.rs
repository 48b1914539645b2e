//! Function calling types exchanged with the Responses API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Function call requested by the model.
///
/// `raw_arguments` is kept verbatim; use [`FunctionCall::arguments`] to get a
/// parsed value. Parsing is intentionally tolerant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub call_id: String,
    pub name: String,
    pub raw_arguments: String,
}

impl FunctionCall {
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        raw_arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }

    /// Parsed arguments. Blank or malformed JSON yields an empty object.
    pub fn arguments(&self) -> Value {
        parse_function_arguments(&self.raw_arguments)
    }
}

pub fn parse_function_arguments(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str::<Value>(trimmed).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "malformed function arguments, using empty object");
        Value::Object(Default::default())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_arguments_are_parsed() {
        let call = FunctionCall::new("c1", "f", r#" {"code": "print(1)"} "#);
        assert_eq!(call.arguments(), json!({"code": "print(1)"}));
    }

    #[test]
    fn malformed_or_blank_arguments_become_empty_object() {
        assert_eq!(parse_function_arguments("{not json"), json!({}));
        assert_eq!(parse_function_arguments("   "), json!({}));
        assert_eq!(parse_function_arguments(""), json!({}));
    }
}
