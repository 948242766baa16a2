//! Response envelope
//!
//! Every `tools/call` answers with the same shape, success or not:
//! `{"content": [{"type": "text", "text": ...}], "isError": bool}`.

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Appended to every failure message
pub const RECOVERY_HINT: &str = "Please check your credentials and try again.";

/// One content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// Uniform tool response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<TextContent>,
    pub is_error: bool,
}

impl ToolResponse {
    /// Successful response carrying one text block
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text".to_string(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    /// Failure response for `tool`
    pub fn failure(tool: &str, error: &ToolError) -> Self {
        let reason = error.to_string();
        let text = format!(
            "Failed to {}: {}. {}",
            readable_tool_name(tool),
            reason.trim_end_matches('.'),
            RECOVERY_HINT
        );
        Self {
            content: vec![TextContent {
                kind: "text".to_string(),
                text,
            }],
            is_error: true,
        }
    }

    /// All text blocks joined, mostly for tests and logs
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `getTestsForBuild` -> `get tests for build`
pub fn readable_tool_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        if c.is_uppercase() {
            out.push(' ');
        }
        out.extend(c.to_lowercase());
    }
    out.trim().to_string()
}
