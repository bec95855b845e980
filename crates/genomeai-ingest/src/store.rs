//! Processing record store
//!
//! One pretty-printed JSON document per record under
//! `<storage_root>/processing_records/<record_id>.json`. Writes go to a hidden
//! temporary sibling first and are renamed into place, so readers never see a
//! half-written record.
//!
//! Read-modify-write on a single record is serialized with a per-record lock.
//! The locks are in-process only; two processes sharing a directory get
//! unique ids but no update serialization between them.

use crate::config::IngestConfig;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use genomeai_common::{
    GenomeAiError, Metadata, NewRecord, ProcessingRecord, ProcessingStatus, Result,
};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Attempts at finding a free id before giving up
const MAX_ID_ATTEMPTS: u32 = 1000;

/// Owner ids longer than this are truncated when building record ids
const MAX_OWNER_ID_CHARS: usize = 64;

/// How `update_status` treats backward moves in the lifecycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Apply any requested status
    #[default]
    Unguarded,

    /// Reject moves that leave a terminal state or go backwards
    ForwardOnly,
}

/// File-backed store of processing records
pub struct RecordStore {
    records_dir: PathBuf,
    policy: TransitionPolicy,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    last_created: Mutex<Option<DateTime<Utc>>>,
}

impl RecordStore {
    /// Open a store rooted at `records_dir`, creating the directory if needed
    pub fn open(records_dir: impl Into<PathBuf>) -> Result<Self> {
        let records_dir = records_dir.into();
        fs::create_dir_all(&records_dir).map_err(|e| {
            GenomeAiError::storage(format!(
                "Failed to create records directory {}: {}",
                records_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            records_dir,
            policy: TransitionPolicy::default(),
            locks: Mutex::new(HashMap::new()),
            last_created: Mutex::new(None),
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        Ok(Self::open(config.records_dir())?.with_policy(config.transition_policy()))
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn records_dir(&self) -> &Path {
        &self.records_dir
    }

    /// Persist a new record in `queued` state and return it with its id.
    ///
    /// Nothing is left on disk when the write fails.
    pub fn create(&self, new: NewRecord) -> Result<ProcessingRecord> {
        let created_at = self.next_creation_time()?;
        let base_id = format!(
            "{}_{}",
            sanitize_owner(&new.owner_id),
            created_at.format("%Y%m%d_%H%M%S_%6f")
        );
        let (record_id, reserved) = self.reserve_id(&base_id)?;
        let record = new.into_record(record_id, created_at);

        if let Err(e) = self.write_record(&record) {
            if let Err(cleanup) = fs::remove_file(&reserved) {
                warn!(
                    record_id = %record.record_id,
                    error = %cleanup,
                    "Failed to remove reserved record file"
                );
            }
            return Err(e);
        }

        info!(
            record_id = %record.record_id,
            owner_id = %record.owner_id,
            format = %record.format,
            "Created processing record"
        );
        Ok(record)
    }

    /// Set a record's status, merging `results` key-wise into existing results.
    ///
    /// Concurrent updates of the same record are serialized; fields not
    /// touched by the update are preserved.
    pub fn update_status(
        &self,
        record_id: &str,
        status: ProcessingStatus,
        results: Option<Metadata>,
    ) -> Result<ProcessingRecord> {
        check_record_id(record_id)?;

        let lock = self.record_lock(record_id)?;
        let updated = match lock.lock() {
            Ok(_guard) => self.apply_update(record_id, status, results),
            Err(e) => Err(GenomeAiError::storage(format!("Record lock poisoned: {}", e))),
        };
        self.release_lock(record_id, lock);
        updated
    }

    fn apply_update(
        &self,
        record_id: &str,
        status: ProcessingStatus,
        results: Option<Metadata>,
    ) -> Result<ProcessingRecord> {
        let mut record = self.read_record(record_id)?;

        if self.policy == TransitionPolicy::ForwardOnly && !record.status.can_advance_to(status) {
            return Err(GenomeAiError::InvalidTransition {
                record_id: record_id.to_string(),
                from: record.status,
                to: status,
            });
        }

        let previous = record.status;
        record.status = status;
        record.updated_at = Utc::now().max(record.created_at);
        if let Some(results) = results {
            record
                .results
                .get_or_insert_with(Metadata::new)
                .extend(results);
        }

        self.write_record(&record)?;

        info!(record_id, from = %previous, to = %status, "Updated processing status");
        Ok(record)
    }

    /// Load a copy of a record
    pub fn get(&self, record_id: &str) -> Result<ProcessingRecord> {
        check_record_id(record_id)?;
        self.read_record(record_id)
    }

    /// All records of one owner, newest first.
    ///
    /// Unreadable entries are skipped with a warning. Records created while
    /// the scan runs may or may not be included.
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ProcessingRecord>> {
        let entries = match fs::read_dir(&self.records_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GenomeAiError::storage(format!(
                    "Failed to list {}: {}",
                    self.records_dir.display(),
                    e
                )))
            },
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                },
            };
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable processing record");
                    continue;
                },
            };
            if bytes.is_empty() {
                // Id reserved by an in-flight create
                debug!(path = %path.display(), "Skipping reserved record");
                continue;
            }

            match serde_json::from_slice::<ProcessingRecord>(&bytes) {
                Ok(record) if record.owner_id == owner_id => records.push(record),
                Ok(_) => {},
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping corrupt processing record");
                },
            }
        }

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| id_order_key(&b.record_id).cmp(&id_order_key(&a.record_id)))
        });
        Ok(records)
    }

    pub fn record_path(&self, record_id: &str) -> PathBuf {
        self.records_dir.join(format!("{}.json", record_id))
    }

    fn read_record(&self, record_id: &str) -> Result<ProcessingRecord> {
        let path = self.record_path(record_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(GenomeAiError::RecordNotFound(record_id.to_string()))
            },
            Err(e) => {
                return Err(GenomeAiError::storage(format!(
                    "Failed to read record {}: {}",
                    record_id, e
                )))
            },
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            GenomeAiError::storage(format!("Corrupt record {}: {}", record_id, e))
        })
    }

    /// Write a record via a temporary sibling and an atomic rename
    fn write_record(&self, record: &ProcessingRecord) -> Result<()> {
        let final_path = self.record_path(&record.record_id);
        let tmp_path = self
            .records_dir
            .join(format!(".{}.json.tmp", record.record_id));

        let written = serde_json::to_vec_pretty(record)
            .map_err(io::Error::from)
            .and_then(|content| {
                let mut file = File::create(&tmp_path)?;
                file.write_all(&content)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp_path, &final_path));

        written.map_err(|e| {
            if tmp_path.exists() {
                if let Err(cleanup) = fs::remove_file(&tmp_path) {
                    warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove temporary record file");
                }
            }
            GenomeAiError::storage(format!(
                "Failed to write record {}: {}",
                record.record_id, e
            ))
        })
    }

    /// Claim `base_id`, or `base_id_N` if taken, with an exclusive create
    fn reserve_id(&self, base_id: &str) -> Result<(String, PathBuf)> {
        for attempt in 0..MAX_ID_ATTEMPTS {
            let candidate = if attempt == 0 {
                base_id.to_string()
            } else {
                format!("{}_{}", base_id, attempt)
            };
            let path = self.record_path(&candidate);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok((candidate, path)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(record_id = %candidate, "Record id taken, trying next suffix");
                },
                Err(e) => {
                    return Err(GenomeAiError::storage(format!(
                        "Failed to reserve record {}: {}",
                        candidate, e
                    )))
                },
            }
        }

        Err(GenomeAiError::storage(format!(
            "No free record id for {} after {} attempts",
            base_id, MAX_ID_ATTEMPTS
        )))
    }

    fn record_lock(&self, record_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| GenomeAiError::storage(format!("Lock table poisoned: {}", e)))?;
        Ok(locks
            .entry(record_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Drop the table entry once no other caller holds the record's lock
    fn release_lock(&self, record_id: &str, lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        let unshared = locks
            .get(record_id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if unshared {
            locks.remove(record_id);
        }
    }

    /// Microsecond-precision creation time, strictly increasing per store
    fn next_creation_time(&self) -> Result<DateTime<Utc>> {
        let mut last = self
            .last_created
            .lock()
            .map_err(|e| GenomeAiError::storage(format!("Clock lock poisoned: {}", e)))?;

        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        Ok(now)
    }
}

/// Owner id reduced to file-name-safe characters
fn sanitize_owner(owner_id: &str) -> String {
    let cleaned: String = owner_id
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_OWNER_ID_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}

/// Split a trailing collision suffix (`_N`) off a record id.
///
/// Microsecond fields are always six digits, so a shorter numeric tail can
/// only be a suffix added by `reserve_id`.
fn id_order_key(record_id: &str) -> (&str, u32) {
    match record_id.rsplit_once('_') {
        Some((base, tail))
            if !tail.is_empty() && tail.len() < 6 && tail.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (base, tail.parse().unwrap_or(0))
        },
        _ => (record_id, 0),
    }
}

/// Ids that could escape the records directory cannot name a record
fn check_record_id(record_id: &str) -> Result<()> {
    let escapes = record_id.is_empty()
        || record_id.starts_with('.')
        || record_id.contains(['/', '\\', '\0']);
    if escapes {
        return Err(GenomeAiError::RecordNotFound(record_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use genomeai_common::FormatId;
    use serde_json::json;
    use tempfile::TempDir;

    fn new_record(owner: &str) -> NewRecord {
        let mut metadata = Metadata::new();
        metadata.insert("project".to_string(), json!("cohort-7"));
        NewRecord {
            owner_id: owner.to_string(),
            original_name: "calls.vcf".to_string(),
            stored_path: "/uploads/calls.vcf".to_string(),
            size_bytes: 42,
            content_hash: "ab".repeat(32),
            format: FormatId::Vcf,
            metadata,
        }
    }

    fn store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("processing_records")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_then_get() {
        let (_dir, store) = store();
        let supplied = new_record("alice");
        let created = store.create(supplied.clone()).unwrap();

        let loaded = store.get(&created.record_id).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.status, ProcessingStatus::Queued);
        assert_eq!(loaded.owner_id, supplied.owner_id);
        assert_eq!(loaded.metadata, supplied.metadata);
        assert_eq!(loaded.content_hash, supplied.content_hash);
        assert_eq!(loaded.updated_at, loaded.created_at);
        assert!(loaded.results.is_none());
        assert!(loaded.record_id.starts_with("alice_"));
    }

    #[test]
    fn test_record_file_layout() {
        let (_dir, store) = store();
        let created = store.create(new_record("alice")).unwrap();
        let path = store.record_path(&created.record_id);
        assert!(path.exists());

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(value["status"], "queued");
        assert_eq!(value["format"], "vcf");
        assert_eq!(value["metadata"]["project"], "cohort-7");
    }

    #[test]
    fn test_ids_are_unique_and_creation_is_ordered() {
        let (_dir, store) = store();
        let a = store.create(new_record("alice")).unwrap();
        let b = store.create(new_record("alice")).unwrap();
        assert_ne!(a.record_id, b.record_id);
        assert!(b.created_at > a.created_at);
    }

    #[test]
    fn test_owner_is_sanitized_in_id() {
        let (_dir, store) = store();
        let created = store.create(new_record("../evil/owner")).unwrap();
        assert!(created.record_id.starts_with("___evil_owner_"));
        assert_eq!(created.owner_id, "../evil/owner");
        assert!(store.get(&created.record_id).is_ok());
    }

    #[test]
    fn test_reserve_id_appends_suffix_on_collision() {
        let (_dir, store) = store();
        std::fs::write(store.record_path("bob_20240101_000000_000000"), b"").unwrap();
        let (id, _) = store.reserve_id("bob_20240101_000000_000000").unwrap();
        assert_eq!(id, "bob_20240101_000000_000000_1");
    }

    #[test]
    fn test_update_unknown_record() {
        let (_dir, store) = store();
        let err = store
            .update_status("nobody_20240101_000000_000000", ProcessingStatus::Processing, None)
            .unwrap_err();
        assert!(matches!(err, GenomeAiError::RecordNotFound(_)));
    }

    #[test]
    fn test_path_like_ids_are_not_found() {
        let (_dir, store) = store();
        for id in ["../secrets", "a/b", ".hidden", ""] {
            assert!(matches!(store.get(id), Err(GenomeAiError::RecordNotFound(_))));
        }
    }

    #[test]
    fn test_update_merges_results_and_keeps_metadata() {
        let (_dir, store) = store();
        let created = store.create(new_record("alice")).unwrap();

        let mut first = Metadata::new();
        first.insert("variants".to_string(), json!(120));
        store
            .update_status(&created.record_id, ProcessingStatus::Processing, Some(first))
            .unwrap();

        let mut second = Metadata::new();
        second.insert("report".to_string(), json!("report.html"));
        let updated = store
            .update_status(&created.record_id, ProcessingStatus::Completed, Some(second))
            .unwrap();

        let results = updated.results.unwrap();
        assert_eq!(results["variants"], json!(120));
        assert_eq!(results["report"], json!("report.html"));
        assert_eq!(updated.metadata, created.metadata);
        assert!(updated.updated_at >= created.created_at);
        assert_eq!(store.get(&created.record_id).unwrap().status, ProcessingStatus::Completed);
    }

    #[test]
    fn test_unguarded_allows_backward_moves() {
        let (_dir, store) = store();
        let created = store.create(new_record("alice")).unwrap();
        store
            .update_status(&created.record_id, ProcessingStatus::Completed, None)
            .unwrap();
        let reverted = store
            .update_status(&created.record_id, ProcessingStatus::Queued, None)
            .unwrap();
        assert_eq!(reverted.status, ProcessingStatus::Queued);
    }

    #[test]
    fn test_forward_only_rejects_backward_moves() {
        let (_dir, store) = store();
        let store = store.with_policy(TransitionPolicy::ForwardOnly);
        let created = store.create(new_record("alice")).unwrap();
        store
            .update_status(&created.record_id, ProcessingStatus::Processing, None)
            .unwrap();
        store
            .update_status(&created.record_id, ProcessingStatus::Failed, None)
            .unwrap();

        let err = store
            .update_status(&created.record_id, ProcessingStatus::Queued, None)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert_eq!(store.get(&created.record_id).unwrap().status, ProcessingStatus::Failed);
    }

    #[test]
    fn test_list_by_owner_orders_and_isolates() {
        let (_dir, store) = store();
        let first = store.create(new_record("alice")).unwrap();
        store.create(new_record("bob")).unwrap();
        let second = store.create(new_record("alice")).unwrap();

        let listed = store.list_by_owner("alice").unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec![second.record_id.as_str(), first.record_id.as_str()]);
        assert!(listed.iter().all(|r| r.owner_id == "alice"));
    }

    #[test]
    fn test_list_ties_order_by_collision_suffix_descending() {
        let (_dir, store) = store();
        let base = store.create(new_record("alice")).unwrap();
        for suffix in [2, 10] {
            let mut copy = base.clone();
            copy.record_id = format!("{}_{}", base.record_id, suffix);
            store.write_record(&copy).unwrap();
        }

        let listed = store.list_by_owner("alice").unwrap();
        let ids: Vec<String> = listed.into_iter().map(|r| r.record_id).collect();
        assert_eq!(
            ids,
            vec![
                format!("{}_10", base.record_id),
                format!("{}_2", base.record_id),
                base.record_id.clone(),
            ]
        );
    }

    #[test]
    fn test_id_order_key() {
        assert_eq!(id_order_key("alice_20240118_120000_000001"), ("alice_20240118_120000_000001", 0));
        assert_eq!(id_order_key("alice_20240118_120000_000001_12"), ("alice_20240118_120000_000001", 12));
        assert_eq!(id_order_key("alice_"), ("alice_", 0));
    }

    #[test]
    fn test_lock_table_is_drained_after_updates() {
        let (_dir, store) = store();
        for _ in 0..5 {
            let created = store.create(new_record("alice")).unwrap();
            store
                .update_status(&created.record_id, ProcessingStatus::Processing, None)
                .unwrap();
        }
        store
            .update_status("missing_record", ProcessingStatus::Failed, None)
            .unwrap_err();

        assert!(store.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_lock_table_is_drained_after_concurrent_updates() {
        let (_dir, store) = store();
        let created = store.create(new_record("alice")).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    store
                        .update_status(&created.record_id, ProcessingStatus::Processing, None)
                        .unwrap();
                });
            }
        });

        assert!(store.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_corrupt_and_reserved_entries() {
        let (_dir, store) = store();
        let created = store.create(new_record("alice")).unwrap();
        std::fs::write(store.record_path("broken"), b"{not json").unwrap();
        std::fs::write(store.record_path("reserved"), b"").unwrap();
        std::fs::write(store.records_dir().join("notes.txt"), b"ignore me").unwrap();

        let listed = store.list_by_owner("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].record_id, created.record_id);
    }

    #[test]
    fn test_get_corrupt_record_is_storage_error() {
        let (_dir, store) = store();
        std::fs::write(store.record_path("broken"), b"{not json").unwrap();
        assert_eq!(store.get("broken").unwrap_err().code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_list_on_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("records")).unwrap();
        std::fs::remove_dir(store.records_dir()).unwrap();
        assert!(store.list_by_owner("alice").unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let (_dir, store) = store();
        let record = new_record("alice").into_record("ghost".to_string(), Utc::now());
        std::fs::create_dir(store.record_path("ghost")).unwrap();

        assert!(store.write_record(&record).is_err());
        assert!(!store.records_dir().join(".ghost.json.tmp").exists());
    }
}
