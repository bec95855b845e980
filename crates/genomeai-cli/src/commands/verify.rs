//! `genomeai verify` command implementation
//!
//! Re-hashes a record's stored file and compares against the recorded SHA-256.

use super::Context;
use crate::display::short_hash;
use crate::error::Result;
use colored::Colorize;
use genomeai_ingest::ingest::Ingestor;
use serde_json::json;

pub async fn run(ctx: &Context, record_id: &str) -> Result<()> {
    let ingestor = Ingestor::from_config(ctx.config.clone())?;
    let record = ingestor.verify(record_id).await?;

    if ctx.json {
        return ctx.print_json(&json!({
            "success": true,
            "record_id": record.record_id,
            "stored_path": record.stored_path,
            "content_hash": record.content_hash,
        }));
    }

    println!(
        "{} {} matches its fingerprint ({})",
        "✓".green(),
        record.stored_path,
        short_hash(&record.content_hash)
    );
    Ok(())
}
