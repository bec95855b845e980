//! `genomeai status`, `list` and `update` command implementations

use super::Context;
use crate::display::{records_table, render_record, status_label};
use crate::error::{CliError, Result};
use colored::Colorize;
use genomeai_common::{Metadata, ProcessingStatus};
use genomeai_ingest::store::RecordStore;
use serde_json::Value;

/// Show one record
pub async fn status(ctx: &Context, record_id: &str) -> Result<()> {
    let store = RecordStore::from_config(&ctx.config)?;
    let record = store.get(record_id)?;

    if ctx.json {
        return ctx.print_json(&record);
    }
    print!("{}", render_record(&record));
    Ok(())
}

/// List an owner's records, newest first
pub async fn list(ctx: &Context, owner: &str) -> Result<()> {
    let store = RecordStore::from_config(&ctx.config)?;
    let records = store.list_by_owner(owner)?;

    if ctx.json {
        return ctx.print_json(&records);
    }

    if records.is_empty() {
        println!("No processing records found for '{}'.", owner);
        println!("Run 'genomeai ingest <file> --owner {}' to add one.", owner);
        return Ok(());
    }

    println!("{}", format!("Processing records for {}:", owner).cyan().bold());
    print!("{}", records_table(&records));
    println!("  Total records: {}", records.len());
    Ok(())
}

/// Set a record's status, optionally merging results
pub async fn update(
    ctx: &Context,
    record_id: &str,
    status: &str,
    results: Option<&str>,
) -> Result<()> {
    let status: ProcessingStatus = status
        .parse()
        .map_err(|_| CliError::invalid_argument(format!("unknown status '{}'", status)))?;
    let results = results.map(parse_results).transpose()?;

    let store = RecordStore::from_config(&ctx.config)?;
    let record = store.update_status(record_id, status, results)?;

    if ctx.json {
        return ctx.print_json(&record);
    }
    println!(
        "{} {} is now {}",
        "✓".green(),
        record.record_id,
        status_label(record.status)
    );
    Ok(())
}

fn parse_results(raw: &str) -> Result<Metadata> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::invalid_argument("--results must be a JSON object")),
    }
}
