//! Error types for brook-conversation

use thiserror::Error;

/// Result type alias using the stream runner error
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors a stream runner can surface, either when establishing the stream
/// or as an item mid-stream.
///
/// Cancellation is deliberately not a variant: it travels on the
/// cancellation token, and a cancelled turn is not a failed one.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The runner failed before yielding anything
    #[error("failed to establish stream: {0}")]
    Connect(String),

    /// The stream raised after it started producing
    #[error("stream failed: {0}")]
    Stream(String),

    /// A provider payload could not be decoded
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A tool-calling backend reported a tool-level fault
    #[error("tool error: {0}")]
    Tool(String),
}
