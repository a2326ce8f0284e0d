//! Post-processing for model output in `clean` mode.
//!
//! Small models asked for "JSON only" still wrap their answer in reasoning blocks
//! (`<think>...</think>`) and markdown fences. These helpers peel both off and
//! re-validate what is left as a JSON object or array.

use once_cell::sync::Lazy;
use serde_json::Value;

pub const THINK_START: &str = "<think>";
pub const THINK_END: &str = "</think>";
const FENCE: &str = "```";

/// Payload returned when the model output cannot be recovered as JSON.
pub static DEFAULT_FALLBACK: Lazy<Value> =
    Lazy::new(|| serde_json::json!({ "error": "AI returned invalid JSON" }));

/// Remove every `<think>...</think>` span from `text`.
///
/// - An opening tag without a closing tag drops everything after it (reasoning was truncated).
/// - A closing tag before any opening tag drops everything before it (the model started
///   in reasoning mode and never emitted `<think>`).
pub fn strip_reasoning(text: &str) -> String {
    let mut rest = text;

    if let Some(end) = rest.find(THINK_END) {
        if !rest[..end].contains(THINK_START) {
            rest = &rest[end + THINK_END.len()..];
        }
    }

    let mut out = String::with_capacity(rest.len());
    loop {
        let Some(start) = rest.find(THINK_START) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..start]);
        let inside = &rest[start + THINK_START.len()..];
        match inside.find(THINK_END) {
            Some(end) => rest = &inside[end + THINK_END.len()..],
            None => break,
        }
    }

    // Stray closers left behind by nested tags.
    out.replace(THINK_END, "").trim().to_string()
}

/// Return the body of the first markdown code block in `text`, or the trimmed text
/// when there is no fence. The language tag on the opening line is dropped and an
/// unclosed fence runs to the end of the input.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let after_open = &trimmed[open + FENCE.len()..];
    let body = match after_open.find('\n') {
        Some(nl) if is_language_tag(&after_open[..nl]) => &after_open[nl + 1..],
        _ => after_open,
    };
    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

fn is_language_tag(s: &str) -> bool {
    s.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Strip reasoning and fences, then parse the remainder as a JSON object or array.
///
/// If the cleaned text still carries prose around the JSON, a second attempt is made
/// on the outermost `{...}` / `[...]` slice. Bare scalars are rejected.
pub fn parse_model_json(text: &str) -> Option<Value> {
    let without_reasoning = strip_reasoning(text);
    let candidate = strip_code_fences(&without_reasoning);
    parse_structured(candidate)
        .or_else(|| outermost_json_slices(candidate).find_map(parse_structured))
}

/// `parse_model_json`, falling back to `fallback` when the output is not valid JSON.
pub fn clean_model_output(text: &str, fallback: &Value) -> Value {
    match parse_model_json(text) {
        Some(v) => v,
        None => {
            tracing::warn!(
                output_len = text.len(),
                "model output is not valid JSON after cleanup; using fallback payload"
            );
            fallback.clone()
        }
    }
}

fn parse_structured(s: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(s) {
        Ok(v @ (Value::Object(_) | Value::Array(_))) => Some(v),
        _ => None,
    }
}

/// Outermost `{...}` and `[...]` spans, the one that opens first coming first.
fn outermost_json_slices(s: &str) -> impl Iterator<Item = &str> {
    let mut spans: Vec<(usize, &str)> = [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| {
            let start = s.find(open)?;
            let end = s.rfind(close)?;
            (end > start).then(|| (start, &s[start..=end]))
        })
        .collect();
    spans.sort_by_key(|(start, _)| *start);
    spans.into_iter().map(|(_, slice)| slice)
}
