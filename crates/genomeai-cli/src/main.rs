//! GenomeAI CLI - Main entry point

use clap::Parser;
use colored::Colorize;
use genomeai_cli::commands::{self, ingest::IngestArgs, Context};
use genomeai_cli::{Cli, Commands};
use genomeai_common::logging::{init_logging, LogConfig, LogLevel};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::new(level).with_file_prefix("genomeai-cli");

    // Environment variables take precedence over the flags
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = execute_command(&cli).await {
        error!(code = e.code(), error = %e, "Command failed");
        if cli.json {
            println!("{}", e.to_json());
        } else {
            eprintln!("{} [{}]: {}", "Error".red().bold(), e.code(), e);
        }
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> genomeai_cli::Result<()> {
    let ctx = Context::load(cli.storage_root.as_deref(), cli.json)?;

    match &cli.command {
        Commands::Validate { path } => commands::validate::run(&ctx, path).await,

        Commands::Ingest {
            path,
            owner,
            meta,
            metadata_json,
            mime,
            extension,
            stage,
        } => {
            let args = IngestArgs {
                owner: owner.clone(),
                meta: meta.clone(),
                metadata_json: metadata_json.clone(),
                mime: mime.clone(),
                extension: extension.clone(),
                stage: *stage,
            };
            commands::ingest::run(&ctx, path, args).await
        },

        Commands::Status { record_id } => commands::records::status(&ctx, record_id).await,

        Commands::List { owner } => commands::records::list(&ctx, owner).await,

        Commands::Update {
            record_id,
            status,
            results,
        } => commands::records::update(&ctx, record_id, status, results.as_deref()).await,

        Commands::Verify { record_id } => commands::verify::run(&ctx, record_id).await,

        Commands::Formats => commands::formats::run(&ctx).await,
    }
}
