//! GenomeAI Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the GenomeAI data module.
//!
//! # Overview
//!
//! This crate provides the pieces every other workspace member builds on:
//!
//! - **Error Handling**: the ingestion error taxonomy and its stable reason codes
//! - **Checksums**: streaming SHA-256 fingerprints for uploaded files
//! - **Types**: format identifiers, processing statuses and processing records
//! - **Logging**: `tracing` subscriber setup shared by the binaries
//!
//! # Example
//!
//! ```no_run
//! use genomeai_common::checksum::digest_file;
//! use genomeai_common::Result;
//!
//! fn fingerprint(path: &str) -> Result<()> {
//!     let digest = digest_file(path)?;
//!     println!("sha256: {}", digest);
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{GenomeAiError, Result};
pub use types::{FormatId, Metadata, NewRecord, ProcessingRecord, ProcessingStatus};
