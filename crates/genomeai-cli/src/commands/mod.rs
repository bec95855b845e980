//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod formats;
pub mod ingest;
pub mod records;
pub mod validate;
pub mod verify;

use crate::error::Result;
use genomeai_ingest::config::IngestConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub config: IngestConfig,
    pub json: bool,
}

impl Context {
    /// Load configuration from the environment, applying the `--storage-root` override
    pub fn load(storage_root: Option<&Path>, json: bool) -> Result<Self> {
        let mut config = IngestConfig::load()?;
        if let Some(root) = storage_root {
            config.storage_root = PathBuf::from(root);
        }
        config.validate()?;
        Ok(Self { config, json })
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
