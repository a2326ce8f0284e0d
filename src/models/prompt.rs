use serde::{Deserialize, Serialize};

/// Inbound body accepted by `POST /api/ai`.
///
/// Every field is optional on the wire; a missing `prompt` becomes the empty string.
/// Unknown fields are ignored so older frontends keep working.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
    /// Replaces the configured system prompt when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Extra style guidance appended to the system message (e.g. "Use simple vocabulary.").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl PromptRequest {
    /// Parse a raw request body.
    ///
    /// An empty or whitespace-only body is treated as `{}`; anything else must be
    /// a JSON object matching this shape.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    /// The request's system instruction override, ignoring blank strings.
    pub fn system_override(&self) -> Option<&str> {
        self.system_instruction
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
