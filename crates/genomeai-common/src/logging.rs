//! Logging configuration and initialization
//!
//! Binaries install their `tracing` subscriber here. Library code only uses
//! the `tracing` macros with structured fields:
//!
//! ```rust,ignore
//! info!(record_id = %id, format = %format, "Created processing record");
//! warn!(path = %path.display(), error = %err, "Skipping corrupt processing record");
//! ```
//!
//! Console output always goes to stderr so that command output on stdout
//! stays machine-readable. File output rolls daily.
//!
//! # Example
//!
//! ```no_run
//! use genomeai_common::logging::{init_logging, LogConfig, LogLevel};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::new(LogLevel::Info).merge_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("GenomeAI ingestion starting");
//!     Ok(())
//! }
//! ```

use crate::error::{GenomeAiError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Minimum severity that gets logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

const LEVEL_NAMES: [(&str, LogLevel); 6] = [
    ("trace", LogLevel::Trace),
    ("debug", LogLevel::Debug),
    ("info", LogLevel::Info),
    ("warn", LogLevel::Warn),
    ("warning", LogLevel::Warn),
    ("error", LogLevel::Error),
];

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = GenomeAiError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        LEVEL_NAMES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, level)| *level)
            .ok_or_else(|| GenomeAiError::config(format!("Invalid log level: {}", s)))
    }
}

/// Line format of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = GenomeAiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(GenomeAiError::config(format!("Invalid log format: {}", s))),
        }
    }
}

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,

    pub format: LogFormat,

    /// Emit to stderr
    pub console: bool,

    /// Also write daily-rolling files into this directory
    pub file_dir: Option<PathBuf>,

    /// File name prefix ("genomeai" -> "genomeai.2024-01-18")
    pub file_prefix: String,

    /// Extra directives such as "genomeai_ingest=debug"
    pub filter_directives: Option<String>,

    /// Include source file and line in each event
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl LogConfig {
    /// Console-only text logging at `level`
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            format: LogFormat::Text,
            console: true,
            file_dir: None,
            file_prefix: "genomeai".to_string(),
            filter_directives: None,
            include_location: false,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.file_dir = Some(dir.into());
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter_directives = Some(directives.into());
        self
    }

    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }

    /// Defaults overlaid with the environment
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Overlay environment variables on top of this configuration
    ///
    /// Environment variables:
    /// - `GENOMEAI_LOG_LEVEL`: trace, debug, info, warn, error
    /// - `GENOMEAI_LOG_FORMAT`: text, json
    /// - `GENOMEAI_LOG_OUTPUT`: console, file, both
    /// - `GENOMEAI_LOG_DIR`: directory for log files (default `./logs`)
    /// - `GENOMEAI_LOG_FILTER`: comma-separated filter directives
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(level) = std::env::var("GENOMEAI_LOG_LEVEL") {
            self.level = level.parse()?;
        }

        if let Ok(format) = std::env::var("GENOMEAI_LOG_FORMAT") {
            self.format = format.parse()?;
        }

        let dir = std::env::var("GENOMEAI_LOG_DIR").ok().map(PathBuf::from);
        if let Ok(output) = std::env::var("GENOMEAI_LOG_OUTPUT") {
            let (console, file) = match output.trim().to_ascii_lowercase().as_str() {
                "console" | "stderr" => (true, false),
                "file" => (false, true),
                "both" | "all" => (true, true),
                _ => {
                    return Err(GenomeAiError::config(format!(
                        "Invalid log output: {}",
                        output
                    )))
                },
            };
            self.console = console;
            self.file_dir = if file {
                dir.clone()
                    .or_else(|| self.file_dir.take())
                    .or_else(|| Some(PathBuf::from("./logs")))
            } else {
                None
            };
        }
        if self.file_dir.is_some() && dir.is_some() {
            self.file_dir = dir;
        }

        if let Ok(filter) = std::env::var("GENOMEAI_LOG_FILTER") {
            self.filter_directives = Some(filter);
        }

        Ok(self)
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .from_env_lossy();

        let extra = self.filter_directives.as_deref().unwrap_or_default();
        for directive in extra.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            filter = filter.add_directive(
                directive
                    .parse()
                    .with_context(|| format!("Invalid filter directive: {}", directive))?,
            );
        }
        Ok(filter)
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn format_layer<W>(config: &LogConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(FmtSpan::CLOSE);
    match config.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Install the global subscriber described by `config`.
///
/// Call once at startup. When file output is enabled the returned guard
/// flushes the background writer on drop and must outlive all logging.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = config.env_filter()?;
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if config.console {
        layers.push(format_layer(config, std::io::stderr, true));
    }

    if let Some(dir) = &config.file_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(config, writer, false));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
