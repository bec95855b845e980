//! Ingestion orchestrator
//!
//! Sequences detection, validation, fingerprinting, persistence and the
//! queue hand-off into one operation. Validation-stage failures leave no
//! trace on disk. Once a record has been created it is always advanced to
//! `processing`, or marked `failed` if that is impossible.

use crate::catalog;
use crate::config::IngestConfig;
use crate::detect::{self, Detector};
use crate::queue::{NoopQueue, ProcessingQueue};
use crate::store::RecordStore;
use crate::validate::{self, ValidationOutcome};
use genomeai_common::checksum;
use genomeai_common::{
    FormatId, GenomeAiError, Metadata, NewRecord, ProcessingRecord, ProcessingStatus, Result,
};
use serde::Serialize;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One file submitted for ingestion, with its request-scoped context
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRequest {
    /// Already materialized, readable file
    pub path: PathBuf,

    pub owner_id: String,

    /// Owner-supplied, opaque to the core
    pub metadata: Metadata,

    /// Name shown to the owner; defaults to the path's file name
    pub original_name: Option<String>,

    /// Overrides the path's suffix for format detection
    pub extension: Option<String>,

    /// MIME type reported by the upload client, checked leniently
    pub mime_hint: Option<String>,

    /// Correlation id for logs
    pub request_id: Option<String>,
}

impl IngestRequest {
    pub fn new(path: impl Into<PathBuf>, owner_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            owner_id: owner_id.into(),
            metadata: Metadata::new(),
            original_name: None,
            extension: None,
            mime_hint: None,
            request_id: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn with_mime_hint(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Successful ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReceipt {
    pub record_id: String,
    pub format: FormatId,
    pub size_bytes: u64,
    pub content_hash: String,
    pub status: ProcessingStatus,
}

/// Flat success-or-failure view of an ingestion, for JSON consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProcessingStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_format: Option<FormatId>,
}

impl IngestOutcome {
    pub fn from_result(result: &Result<IngestReceipt>) -> Self {
        match result {
            Ok(receipt) => Self {
                success: true,
                record_id: Some(receipt.record_id.clone()),
                format: Some(receipt.format),
                size_bytes: Some(receipt.size_bytes),
                status: Some(receipt.status),
                error_code: None,
                error: None,
                detected_format: None,
            },
            Err(err) => Self {
                success: false,
                record_id: None,
                format: None,
                size_bytes: None,
                status: None,
                error_code: Some(err.code()),
                error: Some(err.to_string()),
                detected_format: err.detected_format(),
            },
        }
    }
}

/// Output of the blocking detect/validate/fingerprint stage
#[derive(Debug)]
struct Inspected {
    /// Absolute form of the submitted path
    stored_path: PathBuf,
    format: FormatId,
    size_bytes: u64,
    content_hash: String,
}

/// Ingestion orchestrator
pub struct Ingestor {
    config: IngestConfig,
    detector: Detector,
    store: Arc<RecordStore>,
    queue: Arc<dyn ProcessingQueue>,
}

impl Ingestor {
    pub fn new(
        config: IngestConfig,
        store: Arc<RecordStore>,
        queue: Arc<dyn ProcessingQueue>,
    ) -> Self {
        Self {
            detector: Detector::new(config.max_file_size_bytes),
            config,
            store,
            queue,
        }
    }

    /// Open the configured store and hand records to a [`NoopQueue`]
    pub fn from_config(config: IngestConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(RecordStore::from_config(&config)?);
        Ok(Self::new(config, store, Arc::new(NoopQueue)))
    }

    pub fn with_queue(mut self, queue: Arc<dyn ProcessingQueue>) -> Self {
        self.queue = queue;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Validate, fingerprint and register one file.
    ///
    /// On a validation-stage error nothing is persisted. Any error after the
    /// record was created is reported as [`GenomeAiError::Storage`] naming the
    /// record.
    #[tracing::instrument(
        skip(self, request),
        fields(owner_id = %request.owner_id, request_id = ?request.request_id, path = %request.path.display())
    )]
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReceipt> {
        let IngestRequest {
            path,
            owner_id,
            metadata,
            original_name,
            extension,
            mime_hint,
            ..
        } = request;

        let detector = self.detector;
        let inspect_path = path.clone();
        let inspected = self
            .run_io_stage(move || inspect(&detector, &inspect_path, extension.as_deref()))
            .await
            .inspect_err(|e| {
                if e.is_validation_failure() {
                    info!(code = e.code(), error = %e, "Rejected upload");
                } else {
                    error!(code = e.code(), error = %e, "Failed to inspect upload");
                }
            })?;

        if let Some(hint) = mime_hint.as_deref() {
            catalog::mime_hint_matches(inspected.format, hint);
        }

        let original_name = original_name.unwrap_or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let new = NewRecord {
            owner_id,
            original_name,
            stored_path: inspected.stored_path.display().to_string(),
            size_bytes: inspected.size_bytes,
            content_hash: inspected.content_hash,
            format: inspected.format,
            metadata,
        };

        let store = Arc::clone(&self.store);
        let record = blocking(move || store.create(new)).await?;

        self.queue.notify(&record.record_id, &record).await;

        let store = Arc::clone(&self.store);
        let record_id = record.record_id.clone();
        let advanced = blocking(move || {
            store.update_status(&record_id, ProcessingStatus::Processing, None)
        })
        .await;

        match advanced {
            Ok(record) => {
                info!(
                    record_id = %record.record_id,
                    format = %record.format,
                    size_bytes = record.size_bytes,
                    "Ingested file"
                );
                Ok(IngestReceipt {
                    record_id: record.record_id,
                    format: record.format,
                    size_bytes: record.size_bytes,
                    content_hash: record.content_hash,
                    status: record.status,
                })
            },
            Err(cause) => Err(self.mark_failed(&record.record_id, cause).await),
        }
    }

    /// Detect and validate a file without registering it
    pub fn validate_file(&self, path: &Path) -> ValidationOutcome {
        validate::validate_file(&self.detector, path)
    }

    /// Re-fingerprint a record's stored file and compare with the recorded hash
    pub async fn verify(&self, record_id: &str) -> Result<ProcessingRecord> {
        let store = Arc::clone(&self.store);
        let id = record_id.to_string();
        let record = blocking(move || store.get(&id)).await?;

        let stored_path = PathBuf::from(&record.stored_path);
        let expected = record.content_hash.clone();
        self.run_io_stage(move || {
            detect::probe_size(&stored_path)?;
            checksum::verify_file_digest(&stored_path, &expected)
        })
        .await?;

        debug!(record_id, "Stored file matches recorded fingerprint");
        Ok(record)
    }

    /// Compensating action for a record that could not reach `processing`
    async fn mark_failed(&self, record_id: &str, cause: GenomeAiError) -> GenomeAiError {
        error!(record_id, error = %cause, "Failed to advance record to processing");

        let mut results = Metadata::new();
        results.insert("error".to_string(), Value::String(cause.to_string()));

        let store = Arc::clone(&self.store);
        let id = record_id.to_string();
        match blocking(move || store.update_status(&id, ProcessingStatus::Failed, Some(results))).await {
            Ok(_) => warn!(record_id, "Marked record as failed"),
            Err(e) => error!(record_id, error = %e, "Could not mark record as failed"),
        }

        GenomeAiError::storage(format!(
            "Record {} was created but could not be advanced to processing: {}",
            record_id, cause
        ))
    }

    /// Run file-reading work off the async runtime, bounded by the configured timeout
    async fn run_io_stage<T, F>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        match self.config.io_timeout() {
            Some(limit) => tokio::time::timeout(limit, blocking(task))
                .await
                .map_err(|_| {
                    GenomeAiError::Io(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("I/O stage exceeded {}s", limit.as_secs()),
                    ))
                })?,
            None => blocking(task).await,
        }
    }
}

fn inspect(detector: &Detector, path: &Path, extension: Option<&str>) -> Result<Inspected> {
    let size_bytes = detect::probe_size(path)?;
    let extension = match extension {
        Some(ext) => ext.to_string(),
        None => detect::extension_of(path),
    };
    let format = detector.classify(path, &extension, size_bytes)?;
    validate::check_content(path, format)?;
    let content_hash = checksum::digest_file(path)?;
    let stored_path = std::fs::canonicalize(path)?;

    Ok(Inspected {
        stored_path,
        format,
        size_bytes,
        content_hash,
    })
}

async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| GenomeAiError::Io(io::Error::other(format!("Blocking task failed: {}", e))))?
}
