//! Downstream processing queue boundary
//!
//! The orchestrator announces every newly created record through
//! [`ProcessingQueue::notify`]. Scheduling the actual analysis is somebody
//! else's job; [`NoopQueue`] just logs.

use async_trait::async_trait;
use genomeai_common::ProcessingRecord;
use tracing::info;

/// Hand-off to downstream analysis (dependency injection)
#[async_trait]
pub trait ProcessingQueue: Send + Sync {
    /// Announce a record that is ready for processing
    async fn notify(&self, record_id: &str, record: &ProcessingRecord);
}

/// Queue that accepts every notification and does nothing with it
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopQueue;

#[async_trait]
impl ProcessingQueue for NoopQueue {
    async fn notify(&self, record_id: &str, record: &ProcessingRecord) {
        info!(
            record_id,
            format = %record.format,
            size_bytes = record.size_bytes,
            "Queued record for processing"
        );
    }
}
