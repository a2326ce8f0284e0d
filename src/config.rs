use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the upstream bearer credential.
pub const API_KEY_ENV: &str = "OLLAMA_API_KEY";
pub const DEFAULT_UPSTREAM_URL: &str = "https://ollama.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama3.2:1b";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// What the relay returns for a successful upstream call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Upstream status and body, byte for byte.
    #[default]
    Raw,
    /// First choice's content with reasoning and fences stripped, re-validated as JSON.
    Clean,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "passthrough" => Ok(OutputMode::Raw),
            "clean" | "json" => Ok(OutputMode::Clean),
            other => Err(format!("unknown output mode: {other}")),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Raw => f.write_str("raw"),
            OutputMode::Clean => f.write_str("clean"),
        }
    }
}

/// Relay settings, read once at startup.
///
/// Environment:
/// - OLLAMA_API_KEY                      -> upstream bearer credential (blank = missing)
/// - PROMPT2CHAT_UPSTREAM_URL            -> full Chat Completions URL
/// - PROMPT2CHAT_MODEL                   -> model id
/// - PROMPT2CHAT_TEMPERATURE             -> sampling temperature (f64)
/// - PROMPT2CHAT_HTTP_TIMEOUT_SECONDS    -> outbound request timeout (u64, > 0)
/// - PROMPT2CHAT_OUTPUT_MODE             -> raw | clean
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub model: String,
    pub temperature: f64,
    pub timeout: Duration,
    pub output_mode: OutputMode,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_mode: OutputMode::Raw,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Blank values count as unset;
    /// unparsable values fall back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let temperature = match get("PROMPT2CHAT_TEMPERATURE") {
            Some(raw) => raw.parse::<f64>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid PROMPT2CHAT_TEMPERATURE; using default");
                defaults.temperature
            }),
            None => defaults.temperature,
        };

        let timeout = match get("PROMPT2CHAT_HTTP_TIMEOUT_SECONDS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n > 0 => Duration::from_secs(n),
                _ => {
                    tracing::warn!(value = %raw, "invalid PROMPT2CHAT_HTTP_TIMEOUT_SECONDS; using default");
                    defaults.timeout
                }
            },
            None => defaults.timeout,
        };

        let output_mode = match get("PROMPT2CHAT_OUTPUT_MODE") {
            Some(raw) => raw.parse::<OutputMode>().unwrap_or_else(|e| {
                tracing::warn!("{e}; using raw");
                OutputMode::Raw
            }),
            None => defaults.output_mode,
        };

        Self {
            api_key: get(API_KEY_ENV),
            upstream_url: get("PROMPT2CHAT_UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            model: get("PROMPT2CHAT_MODEL").unwrap_or(defaults.model),
            temperature,
            timeout,
            output_mode,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> RelayConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, RelayConfig::default());
        assert!(!config.has_api_key());
        assert_eq!(config.upstream_url, "https://ollama.com/v1/chat/completions");
        assert_eq!(config.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("OLLAMA_API_KEY", " sk-test "),
            ("PROMPT2CHAT_UPSTREAM_URL", "http://localhost:11434/v1/chat/completions"),
            ("PROMPT2CHAT_MODEL", "qwen3:4b"),
            ("PROMPT2CHAT_TEMPERATURE", "0.2"),
            ("PROMPT2CHAT_HTTP_TIMEOUT_SECONDS", "30"),
            ("PROMPT2CHAT_OUTPUT_MODE", "Clean"),
        ]);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.upstream_url, "http://localhost:11434/v1/chat/completions");
        assert_eq!(config.model, "qwen3:4b");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.output_mode, OutputMode::Clean);
    }

    #[test]
    fn test_blank_and_invalid_values_fall_back() {
        let config = config_from(&[
            ("OLLAMA_API_KEY", "   "),
            ("PROMPT2CHAT_TEMPERATURE", "warm"),
            ("PROMPT2CHAT_HTTP_TIMEOUT_SECONDS", "0"),
            ("PROMPT2CHAT_OUTPUT_MODE", "fancy"),
        ]);
        assert!(!config.has_api_key());
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.output_mode, OutputMode::Raw);
    }

    #[test]
    fn test_output_mode_parse_and_display() {
        assert_eq!("raw".parse::<OutputMode>(), Ok(OutputMode::Raw));
        assert_eq!("JSON".parse::<OutputMode>(), Ok(OutputMode::Clean));
        assert!("other".parse::<OutputMode>().is_err());
        assert_eq!(OutputMode::Clean.to_string(), "clean");
    }
}
