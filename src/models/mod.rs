//! Wire models for the relay.
//!
//! - `prompt`: the inbound `{ "prompt", "system_instruction", "style" }` body.
//! - `chat`: the outbound Chat Completions payload and the upstream response subset.

pub mod chat;
pub mod prompt;
