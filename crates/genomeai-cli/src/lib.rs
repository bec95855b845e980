//! GenomeAI CLI Library
//!
//! Command-line front end for the GenomeAI ingestion core.
//!
//! # Overview
//!
//! - **Validation**: check a file without registering it (`genomeai validate`)
//! - **Ingestion**: validate, fingerprint and register a file (`genomeai ingest`)
//! - **Records**: inspect and update processing records (`genomeai status/list/update`)
//! - **Integrity**: re-check a stored file's fingerprint (`genomeai verify`)
//! - **Formats**: list the supported formats (`genomeai formats`)

pub mod commands;
pub mod display;
pub mod error;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GenomeAI - scientific file ingestion
#[derive(Parser, Debug)]
#[command(name = "genomeai")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding processing records (overrides GENOMEAI_STORAGE_ROOT)
    #[arg(long, global = true)]
    pub storage_root: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that a file is a well-formed instance of a supported format
    Validate {
        /// File to check
        path: PathBuf,
    },

    /// Validate, fingerprint and register a file for processing
    Ingest {
        /// File to ingest
        path: PathBuf,

        /// Submitting owner id
        #[arg(short, long)]
        owner: String,

        /// Metadata entry as key=value (repeatable)
        #[arg(short, long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,

        /// Metadata as a JSON object, merged before --meta entries
        #[arg(long, value_name = "JSON")]
        metadata_json: Option<String>,

        /// MIME type reported by the upload client
        #[arg(long)]
        mime: Option<String>,

        /// Treat the file as having this extension (e.g. ".vcf")
        #[arg(long)]
        extension: Option<String>,

        /// Copy the file into the upload directory before ingesting
        #[arg(long)]
        stage: bool,
    },

    /// Show one processing record
    Status {
        /// Record id returned by `ingest`
        record_id: String,
    },

    /// List an owner's processing records, newest first
    List {
        /// Owner id
        #[arg(short, long)]
        owner: String,
    },

    /// Set a record's processing status
    Update {
        /// Record id
        record_id: String,

        /// New status (queued, processing, completed, failed)
        status: String,

        /// Results to merge into the record, as a JSON object
        #[arg(long, value_name = "JSON")]
        results: Option<String>,
    },

    /// Re-fingerprint a record's stored file and compare with the recorded hash
    Verify {
        /// Record id
        record_id: String,
    },

    /// List supported formats
    Formats,
}
