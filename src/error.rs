//! Error types for topic-forge operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions
//! - Topic tree generation orchestration
//! - Vocabulary cache loading

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENAI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("The model returned an empty completion")]
    EmptyCompletion,
}

/// Errors that can occur while generating a topic tree.
///
/// Per-branch soft failures (unparseable completions, exhausted retry
/// budgets) never surface here; the orchestrator absorbs them as empty
/// children. Only request validation, configuration problems and a failed
/// main-topic phase cross this boundary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Main topic generation produced no topics for theme '{0}'")]
    MainTopicsFailed(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Errors that can occur while loading a SKOS vocabulary.
#[derive(Debug, Error)]
pub enum VocabError {
    #[error("Failed to fetch vocabulary from '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Failed to parse vocabulary payload: {0}")]
    Parse(#[from] serde_json::Error),
}
