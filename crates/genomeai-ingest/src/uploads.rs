//! Upload staging
//!
//! Copies an incoming file into the upload directory under a collision-free,
//! file-system-safe name before it is ingested.

use chrono::Utc;
use genomeai_common::{GenomeAiError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_STAGE_ATTEMPTS: u32 = 100;

/// Reduce a client-supplied file name to a safe single path component.
///
/// Path separators become word breaks, runs of whitespace become `_`, and
/// anything outside `[A-Za-z0-9._-]` is dropped. Leading and trailing dots
/// and underscores are stripped, so the result can never be `..` or a
/// hidden file. May return an empty string.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Copy `source` to `<upload_dir>/<owner>_<YYYYmmdd_HHMMSS>_<safe name>`.
///
/// The upload directory is created if missing. An existing file is never
/// overwritten; a numeric suffix is added to the prefix instead.
pub fn stage_upload(source: &Path, owner_id: &str, upload_dir: &Path) -> Result<PathBuf> {
    let meta = match fs::metadata(source) {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return Err(GenomeAiError::FileNotFound(source.display().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(GenomeAiError::FileNotFound(source.display().to_string()))
        },
        Err(e) => return Err(GenomeAiError::Io(e)),
    };

    fs::create_dir_all(upload_dir)?;

    let original = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = secure_filename(&original);
    if name.is_empty() {
        name = "upload".to_string();
    }
    let mut owner = secure_filename(owner_id);
    if owner.is_empty() {
        owner = "anonymous".to_string();
    }
    let prefix = format!("{}_{}", owner, Utc::now().format("%Y%m%d_%H%M%S"));

    for attempt in 0..MAX_STAGE_ATTEMPTS {
        let file_name = if attempt == 0 {
            format!("{}_{}", prefix, name)
        } else {
            format!("{}_{}_{}", prefix, attempt, name)
        };
        let target = upload_dir.join(file_name);

        let dest = match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %target.display(), "Staging name taken");
                continue;
            },
            Err(e) => return Err(GenomeAiError::Io(e)),
        };

        if let Err(e) = copy_into(source, dest) {
            discard_partial(&target);
            return Err(GenomeAiError::Io(e));
        }

        info!(
            source = %source.display(),
            staged = %target.display(),
            size_bytes = meta.len(),
            "Staged upload"
        );
        return Ok(target);
    }

    Err(GenomeAiError::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free staging name for {} in {}", name, upload_dir.display()),
    )))
}

/// Remove a half-copied staging file
fn discard_partial(target: &Path) {
    if let Err(e) = fs::remove_file(target) {
        warn!(path = %target.display(), error = %e, "Failed to remove partially staged upload");
    }
}

fn copy_into(source: &Path, dest: File) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(source)?);
    let mut writer = BufWriter::new(dest);
    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}
