//! Error types for the harvest pipeline
//!
//! Every fatal condition propagates to the caller unchanged. The pipeline
//! itself never retries; `is_retryable` only tells the caller whether a
//! fresh run (usually with more scrolling) has a chance to succeed.

use thiserror::Error;

use crate::domain::WishlistField;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarvestError {
    #[error("Document unavailable during {operation}: {reason}")]
    DocumentUnavailable { operation: String, reason: String },

    #[error("Inconsistent field lengths: '{field}' has {actual} values, expected {expected}")]
    InconsistentLengths {
        field: WishlistField,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid CSS selector for {target}: {selector} - {reason}")]
    InvalidSelector {
        target: String,
        selector: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid harvest event: {message}")]
    InvalidEvent { message: String },

    #[error("Snapshot serialization failed: {message}")]
    Serialization { message: String },

    #[error("Harvest cancelled")]
    Cancelled,

    #[error("Harvest timed out after {after_secs}s")]
    TimedOut { after_secs: u64 },
}

impl HarvestError {
    /// Create a document unavailable error for the given operation
    pub fn document_unavailable(operation: &str, reason: impl ToString) -> Self {
        Self::DocumentUnavailable {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }

    /// Whether re-running the whole pipeline could succeed
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::InconsistentLengths { .. } => true,
            Self::DocumentUnavailable { .. } => true,
            Self::TimedOut { .. } => true,
            Self::InvalidSelector { .. } => false,
            Self::InvalidConfig { .. } => false,
            Self::InvalidEvent { .. } => false,
            Self::Serialization { .. } => false,
            Self::Cancelled => false,
        }
    }

    /// Scroll iteration count worth trying on the next run.
    ///
    /// A length mismatch usually means lazy loading was still in flight
    /// when extraction ran, so the hint is two more scroll rounds.
    pub const fn suggested_scroll_iterations(&self, current: u32) -> Option<u32> {
        match self {
            Self::InconsistentLengths { .. } => Some(current.saturating_add(2)),
            _ => None,
        }
    }
}

pub type HarvestResult<T> = Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_lengths_message_names_field() {
        let err = HarvestError::InconsistentLengths {
            field: WishlistField::Price,
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Inconsistent field lengths: 'price' has 2 values, expected 3"
        );
        assert!(err.is_retryable());
        assert_eq!(err.suggested_scroll_iterations(2), Some(4));
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!HarvestError::Cancelled.is_retryable());
        assert!(!HarvestError::invalid_config("bad").is_retryable());
        assert_eq!(HarvestError::Cancelled.suggested_scroll_iterations(2), None);
        assert!(HarvestError::document_unavailable("scroll", "target closed").is_retryable());
    }
}
