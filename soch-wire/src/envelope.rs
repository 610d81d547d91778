//! Tool-bridge result envelope.
//!
//! These types mirror the MCP `tools/call` result on the wire: a list of
//! typed content blocks plus an optional `isError` marker. Downstream code
//! only ever consumes the text of the first block, so the accessors here are
//! deliberately forgiving about absent or non-text content.

use serde::{Deserialize, Serialize};

/// Result envelope returned by a tool-bridge invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolEnvelope {
    /// Content blocks in server order. May be empty.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Tool-level failure flag. Absent means success.
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolEnvelope {
    /// Build a single-text-block envelope. Handy for tests and stub bridges.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Text of the first content block, or `""` when the envelope is empty
    /// or its first block is not text.
    pub fn first_text(&self) -> &str {
        match self.content.first() {
            Some(ContentBlock::Text { text }) => text,
            _ => "",
        }
    }

    /// True when the server flagged the result as a tool-level failure.
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// One typed unit inside a tool envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Plain text payload. Servers occasionally omit the field entirely.
    Text {
        #[serde(default)]
        text: String,
    },
    /// Base64 image payload.
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}
