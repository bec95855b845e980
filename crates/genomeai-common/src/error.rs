//! Error types for GenomeAI ingestion
//!
//! Every failure the core can report maps onto one variant here. Callers that
//! need a machine-readable signal use [`GenomeAiError::code`]; the `Display`
//! output is the free-text explanation meant for display.

use crate::types::{FormatId, ProcessingStatus};
use thiserror::Error;

/// Result type alias for GenomeAI operations
pub type Result<T> = std::result::Result<T, GenomeAiError>;

/// Main error type for GenomeAI
#[derive(Error, Debug)]
pub enum GenomeAiError {
    /// The path does not resolve to an existing regular file
    #[error("File does not exist: {0}")]
    FileNotFound(String),

    /// No processing record is stored under the given id
    #[error("Processing record not found: {0}")]
    RecordNotFound(String),

    #[error("File is empty: {0}")]
    Empty(String),

    #[error("File size ({size} bytes) exceeds maximum allowed size ({limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    /// No catalog entry claims the extension. Not retryable.
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// Format-specific structural check failed
    #[error("Invalid {format} content: {reason}")]
    ContentInvalid { format: FormatId, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence layer failure
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid status transition for record {record_id}: {from} -> {to}")]
    InvalidTransition {
        record_id: String,
        from: ProcessingStatus,
        to: ProcessingStatus,
    },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GenomeAiError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a content validation error
    pub fn content_invalid(format: FormatId, reason: impl Into<String>) -> Self {
        Self::ContentInvalid {
            format,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) | Self::RecordNotFound(_) => "NOT_FOUND",
            Self::Empty(_) => "FILE_EMPTY",
            Self::TooLarge { .. } => "FILE_TOO_LARGE",
            Self::UnsupportedExtension(_) => "UNSUPPORTED_EXTENSION",
            Self::ContentInvalid { .. } => "CONTENT_INVALID",
            Self::Io(_) => "IO_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Format the failing check was run against, when one was detected
    pub fn detected_format(&self) -> Option<FormatId> {
        match self {
            Self::ContentInvalid { format, .. } => Some(*format),
            _ => None,
        }
    }

    /// Whether the failure happened before anything was persisted
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::Empty(_)
                | Self::TooLarge { .. }
                | Self::UnsupportedExtension(_)
                | Self::ContentInvalid { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(GenomeAiError::FileNotFound("a".into()).code(), "NOT_FOUND");
        assert_eq!(GenomeAiError::RecordNotFound("a".into()).code(), "NOT_FOUND");
        assert_eq!(GenomeAiError::Empty("a".into()).code(), "FILE_EMPTY");
        assert_eq!(GenomeAiError::TooLarge { size: 2, limit: 1 }.code(), "FILE_TOO_LARGE");
        assert_eq!(
            GenomeAiError::UnsupportedExtension(".xyz".into()).code(),
            "UNSUPPORTED_EXTENSION"
        );
        assert_eq!(
            GenomeAiError::content_invalid(FormatId::Vcf, "bad").code(),
            "CONTENT_INVALID"
        );
        assert_eq!(GenomeAiError::storage("disk full").code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_content_invalid_carries_format() {
        let err = GenomeAiError::content_invalid(FormatId::Fasta, "no sequences");
        assert_eq!(err.detected_format(), Some(FormatId::Fasta));
        assert!(err.is_validation_failure());
        assert_eq!(err.to_string(), "Invalid fasta content: no sequences");
    }

    #[test]
    fn test_storage_error_is_not_validation_failure() {
        let err = GenomeAiError::storage("rename failed");
        assert!(!err.is_validation_failure());
        assert_eq!(err.detected_format(), None);
    }
}
