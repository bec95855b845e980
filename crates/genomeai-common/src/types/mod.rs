//! Common types used across GenomeAI

use crate::error::GenomeAiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner-supplied metadata attached to a record. Opaque to the core.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Formats
// ============================================================================

/// Identifier of a recognized file format.
///
/// The set is closed: the content validator matches on it exhaustively, so a
/// new format is a compile-checked addition rather than a new string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatId {
    Csv,
    Tsv,
    Xlsx,
    Vcf,
    Fasta,
    Fastq,
    Bed,
    Gff,
    Gtf,
    Sam,
    Bam,
}

impl FormatId {
    /// All formats, in catalog order
    pub const ALL: [FormatId; 11] = [
        FormatId::Csv,
        FormatId::Tsv,
        FormatId::Xlsx,
        FormatId::Vcf,
        FormatId::Fasta,
        FormatId::Fastq,
        FormatId::Bed,
        FormatId::Gff,
        FormatId::Gtf,
        FormatId::Sam,
        FormatId::Bam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatId::Csv => "csv",
            FormatId::Tsv => "tsv",
            FormatId::Xlsx => "xlsx",
            FormatId::Vcf => "vcf",
            FormatId::Fasta => "fasta",
            FormatId::Fastq => "fastq",
            FormatId::Bed => "bed",
            FormatId::Gff => "gff",
            FormatId::Gtf => "gtf",
            FormatId::Sam => "sam",
            FormatId::Bam => "bam",
        }
    }

    /// Upper-case label used in human-readable messages
    pub fn label(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl std::fmt::Display for FormatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FormatId {
    type Err = GenomeAiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FormatId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| GenomeAiError::config(format!("Unknown format: {}", s)))
    }
}

// ============================================================================
// Processing lifecycle
// ============================================================================

/// Processing status of an ingested file.
///
/// The lifecycle runs `queued -> processing -> completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Queued => "queued",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            ProcessingStatus::Queued => 0,
            ProcessingStatus::Processing => 1,
            ProcessingStatus::Completed | ProcessingStatus::Failed => 2,
        }
    }

    /// Whether moving to `next` keeps the state machine forward-only.
    ///
    /// Re-asserting the current state is allowed; leaving a terminal state is not.
    pub fn can_advance_to(&self, next: ProcessingStatus) -> bool {
        if *self == next {
            return true;
        }
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcessingStatus {
    type Err = GenomeAiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(ProcessingStatus::Queued),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            _ => Err(GenomeAiError::config(format!("Unknown processing status: {}", s))),
        }
    }
}

/// Durable lifecycle entry for one ingested file.
///
/// Serialized as one JSON document per record under
/// `<storage_root>/processing_records/<record_id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    /// Generated at creation: owner id plus creation instant
    pub record_id: String,

    /// Submitting principal
    pub owner_id: String,

    /// File name as uploaded
    pub original_name: String,

    /// Where the uploaded file was materialized
    pub stored_path: String,

    pub size_bytes: u64,

    /// Hex-encoded SHA-256 of the full file
    pub content_hash: String,

    pub format: FormatId,

    pub status: ProcessingStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Populated by downstream analysis on terminal states
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Metadata>,
}

/// Fields a caller supplies when creating a record.
///
/// The store fills in the id, status and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub owner_id: String,
    pub original_name: String,
    pub stored_path: String,
    pub size_bytes: u64,
    pub content_hash: String,
    pub format: FormatId,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewRecord {
    /// Materialize the record in `queued` state
    pub fn into_record(self, record_id: String, created_at: DateTime<Utc>) -> ProcessingRecord {
        ProcessingRecord {
            record_id,
            owner_id: self.owner_id,
            original_name: self.original_name,
            stored_path: self.stored_path,
            size_bytes: self.size_bytes,
            content_hash: self.content_hash,
            format: self.format,
            status: ProcessingStatus::Queued,
            created_at,
            updated_at: created_at,
            metadata: self.metadata,
            results: None,
        }
    }
}
