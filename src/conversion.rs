use crate::config::RelayConfig;
use crate::models::chat::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::models::prompt::PromptRequest;
use crate::prompt_config::PromptConfig;

/// System prompt used when neither the request nor the prompt file supplies one.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a JSON-only assistant. Respond ONLY with valid JSON.";

/// Resolve the system message for a request.
///
/// Priority for the base prompt: request `system_instruction` > prompt file `system` > default.
/// The prompt file `appendix` and then the request `style` are appended, separated by
/// blank lines.
pub fn system_message(req: &PromptRequest, prompts: &PromptConfig) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(3);

    let base = req
        .system_override()
        .or_else(|| prompts.system_prompt())
        .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION);
    parts.push(base);

    if let Some(appendix) = prompts.appendix() {
        parts.push(appendix);
    }
    if let Some(style) = req.style.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(style);
    }

    parts.join("\n\n")
}

/// Build the outbound Chat Completions payload for a prompt request.
///
/// Messages are always `[system, user]`; the user prompt is forwarded verbatim
/// (it may be empty). Streaming is never requested.
pub fn to_chat_request(
    req: &PromptRequest,
    config: &RelayConfig,
    prompts: &PromptConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage::system(system_message(req, prompts)),
            ChatMessage::user(req.prompt.clone()),
        ],
        temperature: Some(config.temperature),
        stream: false,
    }
}

/// Text content of the first choice, if the upstream returned one.
pub fn first_choice_text(resp: &ChatCompletionResponse) -> Option<&str> {
    resp.choices
        .first()
        .and_then(|c| c.message.content.as_deref())
}
