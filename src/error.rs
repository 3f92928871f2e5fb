//! Error handling for Plata
//!
//! Defines custom error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use thiserror::Error;

/// Core error types for tracker operations. Database and io failures are
/// carried by anyhow with context; these cover the tracker's own checks.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Result type alias for tracker operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = TrackerError::ValidationError("amount must be positive".to_string());
        assert_eq!(err.to_string(), "validation error: amount must be positive");
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::anyhow!("original error")).context("failed to record expense");
        match result {
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains("failed to record expense"));
                let debug_msg = format!("{:?}", e);
                assert!(debug_msg.contains("original error") || msg.contains("original error"));
            }
            Ok(_) => panic!("expected error"),
        }
    }
}
