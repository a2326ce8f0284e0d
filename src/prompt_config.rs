use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::cleanup::DEFAULT_FALLBACK;

/// Prompt configuration loaded from a JSON file (`--prompt-config=<path>`).
///
/// Example:
/// {
///   "system": "You are a storyteller. Respond ONLY with valid JSON.",
///   "appendix": "STRICT FIDELITY FOR CLASSIC ABRIDGMENTS: ...",
///   "fallback": { "summary": "This story is so secret, even the AI is keeping quiet." },
///   "enabled": true
/// }
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptConfig {
    /// System prompt used when the request does not override it
    #[serde(default)]
    pub system: Option<String>,

    /// Instruction block appended to every system message
    #[serde(default)]
    pub appendix: Option<String>,

    /// Payload returned in clean mode when the model output is not valid JSON
    #[serde(default)]
    pub fallback: Option<Value>,

    /// Whether the file's prompts are applied at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl PromptConfig {
    /// Load prompt configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read prompt config file: {}",
                path.as_ref().display()
            )
        })?;

        let config: PromptConfig =
            serde_json::from_str(&content).with_context(|| "Failed to parse prompt config JSON")?;

        Ok(config)
    }

    /// Load from an optional path; failures are logged and yield an empty config.
    pub fn load_or_empty(path: Option<&str>) -> Self {
        let Some(path) = path else {
            tracing::info!("No prompt config provided");
            return Self::empty();
        };
        tracing::info!("Loading prompt configuration from: {}", path);
        match Self::load_from_file(path) {
            Ok(config) => {
                tracing::info!(
                    "Prompt configuration loaded (enabled: {}, system: {}, appendix: {})",
                    config.enabled,
                    config.system.is_some(),
                    config.appendix.is_some()
                );
                config
            }
            Err(e) => {
                tracing::error!("Failed to load prompt config: {:#}", e);
                tracing::warn!("Continuing with default (empty) prompt config");
                Self::empty()
            }
        }
    }

    /// Create a configuration with no prompts
    pub fn empty() -> Self {
        Self {
            system: None,
            appendix: None,
            fallback: None,
            enabled: true,
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.active(self.system.as_deref())
    }

    pub fn appendix(&self) -> Option<&str> {
        self.active(self.appendix.as_deref())
    }

    /// Fallback payload for clean mode. Applies even when prompts are disabled.
    pub fn fallback(&self) -> &Value {
        self.fallback.as_ref().unwrap_or(&*DEFAULT_FALLBACK)
    }

    fn active<'a>(&self, value: Option<&'a str>) -> Option<&'a str> {
        if !self.enabled {
            return None;
        }
        value.map(str::trim).filter(|s| !s.is_empty())
    }
}
