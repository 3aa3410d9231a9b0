//! Error types for agent-starter

use thiserror::Error;

/// Result type alias for agent-starter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the agent loop and its collaborators
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The plan asked for a tool outside the agent's whitelist.
    #[error("Tool {0} not allowed")]
    ToolDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
