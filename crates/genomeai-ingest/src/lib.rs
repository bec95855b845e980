//! GenomeAI Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Decides whether an uploaded file is a genuine, well-formed instance of a
//! supported scientific format, fingerprints it, and tracks its processing
//! lifecycle on disk.
//!
//! # Pipeline
//!
//! - [`detect`]: existence/size policy and extension lookup in the [`catalog`]
//! - [`validate`]: bounded structural checks per format
//! - [`genomeai_common::checksum`]: streaming SHA-256 fingerprint
//! - [`store`]: one JSON document per processing record
//! - [`queue`]: hand-off boundary to downstream analysis
//! - [`ingest`]: the orchestrator tying the steps together
//!
//! # Supported Formats
//!
//! CSV, TSV, XLSX, VCF, FASTA, FASTQ, BED, GFF, GTF, SAM and BAM.
//!
//! # Example
//!
//! ```no_run
//! use genomeai_ingest::config::IngestConfig;
//! use genomeai_ingest::ingest::{IngestRequest, Ingestor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ingestor = Ingestor::from_config(IngestConfig::load()?)?;
//!     let receipt = ingestor
//!         .ingest(IngestRequest::new("uploads/calls.vcf", "demo_user"))
//!         .await?;
//!     println!("{} -> {}", receipt.record_id, receipt.status);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod detect;
pub mod ingest;
pub mod queue;
pub mod store;
pub mod uploads;
pub mod validate;

pub use genomeai_common::{GenomeAiError, Result};
