#![forbid(unsafe_code)]
#![doc = r#"
Prompt2Chat

Relay single-prompt JSON requests to a hosted Chat Completions API using a server-held credential.

Crate highlights
- Library: pure payload assembly via `to_chat_request(&PromptRequest, &RelayConfig, &PromptConfig)`.
- HTTP server (in `server`): `GET|POST|OPTIONS /api/ai` and `GET /status`.
- Post-processing (in `cleanup`): `<think>` stripping, markdown fence stripping, JSON re-validation.

Modules
- `models`: inbound prompt body and outbound Chat Completions shapes.
- `conversion`: mapping from a prompt request to a Chat Completions payload.
- `cleanup`: model output cleanup for `clean` output mode.
- `config`: relay settings read from the environment.
- `prompt_config`: optional JSON prompt file (system prompt, appendix, fallback payload).
- `error`: relay error type and its HTTP mapping.
- `server`: Axum router/handlers (the binary uses this).
- `util`: shared helpers (tracing, env, HTTP client, CORS).
"#]

pub mod cleanup;
pub mod config;
pub mod conversion;
pub mod error;
pub mod models;
pub mod prompt_config;
pub mod server;
pub mod util;

pub use crate::conversion::to_chat_request;
pub use crate::error::RelayError;

// Re-export model namespaces for convenience (downstream users can do `use prompt2chat::chat`).
pub use crate::models::{chat, prompt};
