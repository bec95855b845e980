//! Content validation
//!
//! Bounded structural checks that a file's shape matches its claimed format.
//! These are smoke tests, not grammar parsers: each check reads a small,
//! fixed amount of the file and never fails on stray non-UTF-8 bytes.
//!
//! [`check_content`] reports failures as typed errors for the orchestrator;
//! [`validate`] and [`validate_file`] fold everything into a
//! [`ValidationOutcome`] and never return an error.

mod genomic;
mod tabular;
pub mod text;

pub use genomic::{
    SEQUENCE_SCAN_LINES, VCF_HEADER_SEARCH_LINES, VCF_META_LINE_LIMIT, VCF_REQUIRED_COLUMNS,
};
pub use tabular::{sniff_delimiter, CSV_SAMPLE_BYTES};

use crate::catalog;
use crate::detect::Detector;
use genomeai_common::{FormatId, GenomeAiError, Result};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Reason reported by checks that pass without further detail
pub const OK_REASON: &str = "ok";

/// A passed structural check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passed {
    pub format: FormatId,
    pub reason: String,
    /// Advisory record count for sequence formats
    pub record_count: Option<usize>,
}

impl Passed {
    pub(crate) fn ok(format: FormatId) -> Self {
        Self {
            format,
            reason: OK_REASON.to_string(),
            record_count: None,
        }
    }
}

/// Result of validating a file, always returned as a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,

    /// "ok" on success, otherwise a specific explanation
    pub reason: String,

    /// Absent when detection itself failed
    pub detected_format: Option<FormatId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,

    /// Machine-readable failure code, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl ValidationOutcome {
    pub fn from_result(result: Result<Passed>) -> Self {
        match result {
            Ok(passed) => passed.into(),
            Err(err) => err.into(),
        }
    }
}

impl From<Passed> for ValidationOutcome {
    fn from(passed: Passed) -> Self {
        Self {
            valid: true,
            reason: passed.reason,
            detected_format: Some(passed.format),
            record_count: passed.record_count,
            error_code: None,
        }
    }
}

impl From<GenomeAiError> for ValidationOutcome {
    fn from(err: GenomeAiError) -> Self {
        let reason = match &err {
            GenomeAiError::ContentInvalid { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self {
            valid: false,
            reason,
            detected_format: err.detected_format(),
            record_count: None,
            error_code: Some(err.code()),
        }
    }
}

/// Run the structural check for `format` against a file.
///
/// Content failures come back as [`GenomeAiError::ContentInvalid`]; read
/// failures as [`GenomeAiError::Io`].
pub fn check_content(path: &Path, format: FormatId) -> Result<Passed> {
    check_header_prefix(path, format)?;

    let passed = match format {
        FormatId::Csv => tabular::check_csv(path)?,
        FormatId::Tsv => tabular::check_tsv(path)?,
        FormatId::Vcf => genomic::check_vcf(path)?,
        FormatId::Fasta => genomic::check_sequences(path, format, '>')?,
        FormatId::Fastq => genomic::check_sequences(path, format, '@')?,
        FormatId::Xlsx
        | FormatId::Bed
        | FormatId::Gff
        | FormatId::Gtf
        | FormatId::Sam
        | FormatId::Bam => Passed::ok(format),
    };

    debug!(path = %path.display(), format = %format, reason = %passed.reason, "Content check passed");
    Ok(passed)
}

/// Validate a file against a known format
pub fn validate(path: &Path, format: FormatId) -> ValidationOutcome {
    ValidationOutcome::from_result(check_content(path, format))
}

/// Detect a file's format and validate its content in one step
pub fn validate_file(detector: &Detector, path: &Path) -> ValidationOutcome {
    ValidationOutcome::from_result(
        detector
            .detect(path, None)
            .and_then(|format| check_content(path, format)),
    )
}

fn check_header_prefix(path: &Path, format: FormatId) -> Result<()> {
    let Some(prefix) = catalog::spec_for(format).header_prefix else {
        return Ok(());
    };

    let first_line = text::read_first_line(path)?;
    if first_line.trim().starts_with(prefix) {
        Ok(())
    } else {
        Err(GenomeAiError::content_invalid(
            format,
            format!(
                "missing expected header pattern: first line must start with '{}'",
                prefix
            ),
        ))
    }
}
