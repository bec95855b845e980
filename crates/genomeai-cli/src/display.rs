//! Human-readable rendering of records and formats

use colored::{ColoredString, Colorize};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use genomeai_common::{ProcessingRecord, ProcessingStatus};
use genomeai_ingest::catalog::FormatSpec;
use serde_json::Value;

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

pub fn status_label(status: ProcessingStatus) -> ColoredString {
    match status {
        ProcessingStatus::Queued => status.as_str().yellow(),
        ProcessingStatus::Processing => status.as_str().cyan(),
        ProcessingStatus::Completed => status.as_str().green(),
        ProcessingStatus::Failed => status.as_str().red(),
    }
}

/// First 16 hex digits of a digest
pub fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

/// Multi-line description of one record
pub fn render_record(record: &ProcessingRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", record.record_id.green()));
    out.push_str(&format!("  Owner:    {}\n", record.owner_id));
    out.push_str(&format!("  File:     {}\n", record.original_name));
    out.push_str(&format!("  Stored:   {}\n", record.stored_path));
    out.push_str(&format!("  Format:   {}\n", record.format.label()));
    out.push_str(&format!("  Size:     {}\n", format_bytes(record.size_bytes)));
    out.push_str(&format!("  SHA-256:  {}\n", record.content_hash));
    out.push_str(&format!("  Status:   {}\n", status_label(record.status)));
    out.push_str(&format!("  Created:  {}\n", record.created_at.to_rfc3339()));
    out.push_str(&format!("  Updated:  {}\n", record.updated_at.to_rfc3339()));

    if !record.metadata.is_empty() {
        out.push_str("  Metadata:\n");
        for (key, value) in &record.metadata {
            out.push_str(&format!("    {}: {}\n", key, value_to_string(value)));
        }
    }
    if let Some(results) = &record.results {
        out.push_str("  Results:\n");
        for (key, value) in results {
            out.push_str(&format!("    {}: {}\n", key, value_to_string(value)));
        }
    }
    out
}

/// Records as a table
pub fn records_table(records: &[ProcessingRecord]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Record", "File", "Format", "Size", "Status", "Created"]);

    for record in records {
        table.add_row(vec![
            record.record_id.clone(),
            record.original_name.clone(),
            record.format.label(),
            format_bytes(record.size_bytes),
            record.status.to_string(),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    format!("{}\n", table)
}

/// Catalog entries as a table
pub fn formats_table(specs: &[FormatSpec]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Format", "Extensions", "Header", "MIME types"]);

    for spec in specs {
        table.add_row(vec![
            spec.id.label(),
            spec.extensions.join(", "),
            spec.header_prefix.unwrap_or("-").to_string(),
            spec.mime_types.join(", "),
        ]);
    }

    format!("{}\n", table)
}

/// Convert JSON value to string for display
fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
