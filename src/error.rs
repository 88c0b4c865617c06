//! Error taxonomy for the grading kernel

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while grading a submission
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Language tag has no entry in the language table
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Interpreter/binary could not be launched at all.
    /// Distinct from a non-zero exit, which is part of a normal outcome.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Process exceeded its wall-clock deadline and was killed
    #[error("execution timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl JudgeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, JudgeError::Timeout(_))
    }
}
