//! `genomeai formats` command implementation

use super::Context;
use crate::display::{format_bytes, formats_table};
use crate::error::Result;
use colored::Colorize;
use genomeai_ingest::catalog::CATALOG;
use serde_json::json;

pub async fn run(ctx: &Context) -> Result<()> {
    let max_size = ctx.config.max_file_size_bytes;

    if ctx.json {
        return ctx.print_json(&json!({
            "formats": CATALOG,
            "max_file_size_bytes": max_size,
        }));
    }

    println!("{}", "Supported formats:".cyan().bold());
    print!("{}", formats_table(&CATALOG));
    println!("  Maximum file size: {}", format_bytes(max_size));
    Ok(())
}
