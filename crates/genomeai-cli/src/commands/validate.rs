//! `genomeai validate` command implementation
//!
//! Runs detection and the structural check without touching the record store.

use super::Context;
use crate::error::{CliError, Result};
use colored::Colorize;
use genomeai_ingest::detect::Detector;
use genomeai_ingest::validate;
use std::path::Path;

pub async fn run(ctx: &Context, path: &Path) -> Result<()> {
    let detector = Detector::new(ctx.config.max_file_size_bytes);
    let owned = path.to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || validate::validate_file(&detector, &owned))
        .await
        .map_err(|e| CliError::Other(e.into()))?;

    if !outcome.valid {
        return Err(CliError::ValidationFailed(outcome));
    }

    if ctx.json {
        return ctx.print_json(&outcome);
    }

    let format = outcome
        .detected_format
        .map(|format| format.label())
        .unwrap_or_default();
    println!("{} {} is valid {}", "✓".green(), path.display(), format.cyan());
    println!("  {}", outcome.reason);
    Ok(())
}
