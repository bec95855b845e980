//! Configuration management
//!
//! Everything the core reads from the process environment goes through
//! [`IngestConfig::load`]; the rest of the crate only sees the resulting
//! struct.

use crate::store::TransitionPolicy;
use genomeai_common::{GenomeAiError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default directory holding `processing_records/`.
pub const DEFAULT_STORAGE_ROOT: &str = "data_storage";

/// Default directory uploads are staged into.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Default upload size ceiling (5 GiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Subdirectory of the storage root holding one JSON file per record.
pub const RECORDS_DIR: &str = "processing_records";

/// Ingestion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory for persisted records
    pub storage_root: PathBuf,

    /// Files above this size are rejected before any content is read
    pub max_file_size_bytes: u64,

    /// Where `stage_upload` copies incoming files
    pub upload_dir: PathBuf,

    /// Bound on the blocking validate/fingerprint stage; `None` waits indefinitely
    #[serde(default)]
    pub io_timeout_secs: Option<u64>,

    /// Reject backward status transitions instead of applying them
    #[serde(default)]
    pub enforce_forward_transitions: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            io_timeout_secs: None,
            enforce_forward_transitions: false,
        }
    }
}

impl IngestConfig {
    /// Load configuration from `.env`, the environment and defaults
    ///
    /// Environment variables:
    /// - `GENOMEAI_STORAGE_ROOT`: record storage directory
    /// - `GENOMEAI_MAX_FILE_SIZE_BYTES`: upload size ceiling
    /// - `GENOMEAI_UPLOAD_DIR`: staging directory for uploads
    /// - `GENOMEAI_IO_TIMEOUT_SECS`: timeout for the validate/fingerprint stage
    /// - `GENOMEAI_ENFORCE_TRANSITIONS`: `true` to make status updates forward-only
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from the environment without reading `.env`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(root) = std::env::var("GENOMEAI_STORAGE_ROOT") {
            config.storage_root = PathBuf::from(root);
        }

        if let Ok(max) = std::env::var("GENOMEAI_MAX_FILE_SIZE_BYTES") {
            config.max_file_size_bytes = max.trim().parse().map_err(|_| {
                GenomeAiError::config(format!("GENOMEAI_MAX_FILE_SIZE_BYTES is not a number: {}", max))
            })?;
        }

        if let Ok(dir) = std::env::var("GENOMEAI_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }

        if let Ok(secs) = std::env::var("GENOMEAI_IO_TIMEOUT_SECS") {
            let secs = secs.trim().parse().map_err(|_| {
                GenomeAiError::config(format!("GENOMEAI_IO_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.io_timeout_secs = Some(secs);
        }

        if let Ok(flag) = std::env::var("GENOMEAI_ENFORCE_TRANSITIONS") {
            config.enforce_forward_transitions = match flag.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(GenomeAiError::config(format!(
                        "GENOMEAI_ENFORCE_TRANSITIONS is not a boolean: {}",
                        flag
                    )))
                },
            };
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(GenomeAiError::config("Storage root cannot be empty"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(GenomeAiError::config(
                "Maximum file size must be greater than 0",
            ));
        }

        if self.io_timeout_secs == Some(0) {
            return Err(GenomeAiError::config(
                "I/O timeout must be greater than 0 seconds when set",
            ));
        }

        Ok(())
    }

    /// Directory holding one JSON document per processing record
    pub fn records_dir(&self) -> PathBuf {
        self.storage_root.join(RECORDS_DIR)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_secs.map(Duration::from_secs)
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        if self.enforce_forward_transitions {
            TransitionPolicy::ForwardOnly
        } else {
            TransitionPolicy::Unguarded
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "GENOMEAI_STORAGE_ROOT",
        "GENOMEAI_MAX_FILE_SIZE_BYTES",
        "GENOMEAI_UPLOAD_DIR",
        "GENOMEAI_IO_TIMEOUT_SECS",
        "GENOMEAI_ENFORCE_TRANSITIONS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.storage_root, PathBuf::from("data_storage"));
        assert_eq!(config.max_file_size_bytes, 5 * (1u64 << 30));
        assert_eq!(config.records_dir(), PathBuf::from("data_storage/processing_records"));
        assert_eq!(config.io_timeout(), None);
        assert_eq!(config.transition_policy(), TransitionPolicy::Unguarded);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var("GENOMEAI_STORAGE_ROOT", "/tmp/genomeai-test");
        std::env::set_var("GENOMEAI_MAX_FILE_SIZE_BYTES", "1024");
        std::env::set_var("GENOMEAI_IO_TIMEOUT_SECS", "30");
        std::env::set_var("GENOMEAI_ENFORCE_TRANSITIONS", "true");

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/tmp/genomeai-test"));
        assert_eq!(config.max_file_size_bytes, 1024);
        assert_eq!(config.io_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.transition_policy(), TransitionPolicy::ForwardOnly);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage_size() {
        clear_env();
        std::env::set_var("GENOMEAI_MAX_FILE_SIZE_BYTES", "five gigs");

        let err = IngestConfig::from_env().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_transition_flag() {
        clear_env();
        std::env::set_var("GENOMEAI_ENFORCE_TRANSITIONS", "1");
        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.transition_policy(), TransitionPolicy::ForwardOnly);

        std::env::set_var("GENOMEAI_ENFORCE_TRANSITIONS", "No");
        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.transition_policy(), TransitionPolicy::Unguarded);

        std::env::set_var("GENOMEAI_ENFORCE_TRANSITIONS", "sometimes");
        let err = IngestConfig::from_env().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");

        clear_env();
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = IngestConfig {
            max_file_size_bytes: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());

        let config = IngestConfig {
            io_timeout_secs: Some(0),
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
