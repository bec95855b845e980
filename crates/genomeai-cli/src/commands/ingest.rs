//! `genomeai ingest` command implementation

use super::Context;
use crate::display::{format_bytes, short_hash, status_label};
use crate::error::{CliError, Result};
use colored::Colorize;
use genomeai_common::Metadata;
use genomeai_ingest::ingest::{IngestOutcome, IngestRequest, Ingestor};
use genomeai_ingest::uploads;
use serde_json::Value;
use std::path::Path;

/// Options for one `ingest` invocation
#[derive(Debug, Clone, Default)]
pub struct IngestArgs {
    pub owner: String,
    pub meta: Vec<String>,
    pub metadata_json: Option<String>,
    pub mime: Option<String>,
    pub extension: Option<String>,
    pub stage: bool,
}

pub async fn run(ctx: &Context, path: &Path, args: IngestArgs) -> Result<()> {
    let metadata = parse_metadata(args.metadata_json.as_deref(), &args.meta)?;
    let ingestor = Ingestor::from_config(ctx.config.clone())?;

    let original_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let target = if args.stage {
        uploads::stage_upload(path, &args.owner, &ctx.config.upload_dir)?
    } else {
        path.to_path_buf()
    };

    let mut request = IngestRequest::new(&target, &args.owner)
        .with_metadata(metadata)
        .with_original_name(original_name)
        .with_request_id(format!("cli-{}", std::process::id()));
    if let Some(mime) = args.mime {
        request = request.with_mime_hint(mime);
    }
    if let Some(extension) = args.extension {
        request = request.with_extension(extension);
    }

    let receipt = ingestor.ingest(request).await?;

    if ctx.json {
        return ctx.print_json(&IngestOutcome::from_result(&Ok(receipt)));
    }

    println!("{} Ingested {}", "✓".green(), target.display());
    println!("  Record:  {}", receipt.record_id.bold());
    println!("  Format:  {}", receipt.format.label());
    println!("  Size:    {}", format_bytes(receipt.size_bytes));
    println!("  SHA-256: {}", short_hash(&receipt.content_hash));
    println!("  Status:  {}", status_label(receipt.status));
    Ok(())
}

/// Build metadata from an optional JSON object followed by `key=value` pairs.
///
/// Pair values that parse as JSON scalars (numbers, booleans, null) keep
/// their type; everything else is stored as a string.
pub fn parse_metadata(json: Option<&str>, pairs: &[String]) -> Result<Metadata> {
    let mut metadata = match json {
        Some(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => map,
            _ => {
                return Err(CliError::invalid_argument(
                    "--metadata-json must be a JSON object",
                ))
            },
        },
        None => Metadata::new(),
    };

    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            CliError::invalid_argument(format!("expected KEY=VALUE, got '{}'", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "metadata key is empty in '{}'",
                pair
            )));
        }
        metadata.insert(key.to_string(), scalar_value(value));
    }

    Ok(metadata)
}

fn scalar_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => value,
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_metadata_pairs() {
        let pairs = vec![
            "project=cohort-7".to_string(),
            "replicate=2".to_string(),
            "paired=true".to_string(),
            "note=a=b".to_string(),
        ];
        let metadata = parse_metadata(None, &pairs).unwrap();
        assert_eq!(metadata["project"], json!("cohort-7"));
        assert_eq!(metadata["replicate"], json!(2));
        assert_eq!(metadata["paired"], json!(true));
        assert_eq!(metadata["note"], json!("a=b"));
    }

    #[test]
    fn test_pairs_override_json() {
        let pairs = vec!["project=override".to_string()];
        let metadata =
            parse_metadata(Some(r#"{"project": "base", "tags": ["wgs"]}"#), &pairs).unwrap();
        assert_eq!(metadata["project"], json!("override"));
        assert_eq!(metadata["tags"], json!(["wgs"]));
    }

    #[test]
    fn test_parse_metadata_rejects_bad_input() {
        assert_eq!(
            parse_metadata(None, &["novalue".to_string()]).unwrap_err().code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(
            parse_metadata(None, &["=x".to_string()]).unwrap_err().code(),
            "INVALID_ARGUMENT"
        );
        assert!(parse_metadata(Some("[1, 2]"), &[]).is_err());
        assert!(parse_metadata(Some("{oops"), &[]).is_err());
    }
}
