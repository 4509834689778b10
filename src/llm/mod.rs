//! LLM client infrastructure for topic generation.
//!
//! The [`client`] module provides the OpenAI-compatible chat-completions
//! client and the [`LlmProvider`] trait; [`retry`] wraps any provider with
//! the bounded exponential-backoff policy used for every topic generation
//! call.

pub mod client;
pub mod retry;

pub use client::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, OpenAiClient, Usage,
};
pub use retry::{is_transient, RetryPolicy, RetryingClient};
