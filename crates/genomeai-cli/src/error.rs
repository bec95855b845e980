//! Error types for the GenomeAI CLI
//!
//! Every error carries a stable code printed as `Error [CODE]: message`, so
//! scripts can branch on the code while people read the message.

use genomeai_common::{FormatId, GenomeAiError};
use genomeai_ingest::validate::ValidationOutcome;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Failure reported by the ingestion core
    #[error(transparent)]
    Core(#[from] GenomeAiError),

    /// A file did not pass `genomeai validate`
    #[error("{}", .0.reason)]
    ValidationFailed(ValidationOutcome),

    /// Command-line value could not be interpreted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to parse JSON: {0}. Check the value syntax.")]
    JsonParse(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(e) => e.code(),
            Self::ValidationFailed(outcome) => outcome.error_code.unwrap_or("CONTENT_INVALID"),
            Self::InvalidArgument(_) | Self::JsonParse(_) => "INVALID_ARGUMENT",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn detected_format(&self) -> Option<FormatId> {
        match self {
            Self::Core(e) => e.detected_format(),
            Self::ValidationFailed(outcome) => outcome.detected_format,
            _ => None,
        }
    }

    /// JSON document printed for this error under `--json`
    pub fn to_json(&self) -> Value {
        if let Self::ValidationFailed(outcome) = self {
            return json!(outcome);
        }

        let mut report = json!({
            "success": false,
            "error_code": self.code(),
            "error": self.to_string(),
        });
        if let Some(format) = self.detected_format() {
            report["detected_format"] = json!(format);
        }
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_core_codes_pass_through() {
        let err = CliError::from(GenomeAiError::RecordNotFound("x".into()));
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "Processing record not found: x");
    }

    #[test]
    fn test_json_report_includes_detected_format() {
        let err = CliError::from(GenomeAiError::content_invalid(FormatId::Fasta, "no FASTA sequences"));
        let report = err.to_json();
        assert_eq!(report["success"], false);
        assert_eq!(report["error_code"], "CONTENT_INVALID");
        assert_eq!(report["detected_format"], "fasta");
    }

    #[test]
    fn test_argument_errors() {
        let err = CliError::invalid_argument("expected key=value");
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert!(err.to_json().get("detected_format").is_none());
    }
}
