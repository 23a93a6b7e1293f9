//! LLM gateway
//!
//! An OpenAI-compatible chat client with per-model retries, linear backoff,
//! and sequential fallback models, plus the prompt templates the autofill
//! flow uses. Configuration comes from `FORMFILL_*` environment variables.

pub mod api;
pub mod client;
pub mod config;
pub mod prompts;

pub use client::ChatClient;
pub use config::LlmConfig;
