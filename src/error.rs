use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackwatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Malformed recording at line {line}: {message}")]
    Replay { line: usize, message: String },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl StackwatchError {
    /// True when the error came from the cancellation token rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StackwatchError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, StackwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StackwatchError::Replay {
            line: 3,
            message: "expected value".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed recording at line 3: expected value");
        assert_eq!(StackwatchError::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled() {
        assert!(StackwatchError::Cancelled.is_cancelled());
        let io = StackwatchError::from(std::io::Error::other("broken pipe"));
        assert!(!io.is_cancelled());
    }
}
