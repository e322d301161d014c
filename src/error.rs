//! Structured error types for the Vectra engine.
//!
//! Invalid input, configuration problems and worker-boundary failures all
//! surface as one of these variants. "Nothing found" results (an undo past
//! the floor, a snapping query with no candidates) are not errors and never
//! show up here.

use thiserror::Error;

/// The unified error type returned by all public Vectra API functions.
#[derive(Debug, Error)]
pub enum VectraError {
    /// A text payload failed to parse.
    #[error("Failed to parse payload: {source}{}", format_hint(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// Grid inference was handed an empty rect list.
    #[error("Invalid input: no rects supplied")]
    EmptyInput,

    /// A rect cannot take part in the operation.
    #[error("Invalid rect '{id}': {reason}")]
    InvalidRect { id: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A retained history snapshot could not be restored.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Compile error: {0}")]
    Compile(String),

    /// The worker has not received its initial state yet.
    #[error("{worker} worker is still initializing")]
    NotReady { worker: &'static str },

    /// The worker failed to initialize; every call short-circuits here.
    #[error("{worker} worker is unavailable: {reason}")]
    Unavailable { worker: &'static str, reason: String },

    /// A request panicked inside the worker and was caught there.
    #[error("{worker} worker panicked: {message}")]
    Panicked {
        worker: &'static str,
        message: String,
    },

    /// The worker's queue or reply channel is gone.
    #[error("{worker} worker disconnected")]
    Disconnected { worker: &'static str },

    /// A reply did not match the request it answers.
    #[error("{worker} worker sent an unexpected reply: {detail}")]
    Protocol {
        worker: &'static str,
        detail: String,
    },
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for VectraError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected shape. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the payload truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        VectraError::Parse { source: e, hint }
    }
}

impl VectraError {
    pub(crate) fn invalid_rect(id: &str, reason: impl Into<String>) -> Self {
        VectraError::InvalidRect {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_hint() {
        let err: VectraError = serde_json::from_str::<Vec<u32>>("[1, 2,")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse payload"));
        assert!(msg.contains("Hint: Unexpected end of input"));
    }

    #[test]
    fn test_data_error_hint() {
        let err: VectraError = serde_json::from_str::<Vec<u32>>("[\"a\"]")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("doesn't match the expected shape"));
    }

    #[test]
    fn test_worker_errors_name_the_worker() {
        let err = VectraError::NotReady { worker: "history" };
        assert_eq!(err.to_string(), "history worker is still initializing");
    }
}
