//! Format detection
//!
//! Picks a single candidate format for a file from its extension after the
//! existence and size policy has been applied. Nothing here reads file
//! content; that is the validator's job.

use crate::catalog;
use crate::config::DEFAULT_MAX_FILE_SIZE_BYTES;
use genomeai_common::{FormatId, GenomeAiError, Result};
use std::path::Path;
use tracing::debug;

/// Extension-based format detector with a size ceiling
#[derive(Debug, Clone, Copy)]
pub struct Detector {
    max_file_size: u64,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE_BYTES)
    }
}

impl Detector {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Probe a file on disk and pick its format.
    ///
    /// `extension` overrides the path's own suffix, e.g. when the upload was
    /// materialized under a temporary name.
    pub fn detect(&self, path: &Path, extension: Option<&str>) -> Result<FormatId> {
        let size = probe_size(path)?;
        let extension = match extension {
            Some(ext) => ext.to_string(),
            None => extension_of(path),
        };
        let format = self.classify(path, &extension, size)?;
        debug!(path = %path.display(), format = %format, size, "Detected format");
        Ok(format)
    }

    /// Apply size policy and catalog lookup to an already probed file.
    ///
    /// Order matters: oversize wins over empty, and both win over the
    /// extension check.
    pub fn classify(&self, path: &Path, extension: &str, size: u64) -> Result<FormatId> {
        if size > self.max_file_size {
            return Err(GenomeAiError::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }

        if size == 0 {
            return Err(GenomeAiError::Empty(path.display().to_string()));
        }

        catalog::lookup_extension(extension)
            .map(|spec| spec.id)
            .ok_or_else(|| GenomeAiError::UnsupportedExtension(catalog::normalize_extension(extension)))
    }
}

/// Size of a regular file, or `FileNotFound` for anything else
pub fn probe_size(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => Err(GenomeAiError::FileNotFound(path.display().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GenomeAiError::FileNotFound(path.display().to_string()))
        },
        Err(e) => Err(GenomeAiError::Io(e)),
    }
}

/// Normalized extension of a path, empty when it has none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| catalog::normalize_extension(&ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detect_vcf() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "sample.vcf", b"##fileformat=VCFv4.2\n");
        assert_eq!(Detector::default().detect(&path, None).unwrap(), FormatId::Vcf);
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "READS.FQ", b"@r1\nACGT\n+\nIIII\n");
        assert_eq!(Detector::default().detect(&path, None).unwrap(), FormatId::Fastq);
    }

    #[test]
    fn test_detect_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "sample.unknownext", b"data");
        let err = Detector::default().detect(&path, None).unwrap_err();
        assert!(matches!(err, GenomeAiError::UnsupportedExtension(ref ext) if ext == ".unknownext"));
    }

    #[test]
    fn test_detect_without_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "README", b"data");
        let err = Detector::default().detect(&path, None).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_EXTENSION");
    }

    #[test]
    fn test_detect_extension_override() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "upload.tmp", b">seq1\nACGT\n");
        assert_eq!(
            Detector::default().detect(&path, Some("fa")).unwrap(),
            FormatId::Fasta
        );
    }

    #[test]
    fn test_detect_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Detector::default()
            .detect(&dir.path().join("missing.vcf"), None)
            .unwrap_err();
        assert!(matches!(err, GenomeAiError::FileNotFound(_)));
    }

    #[test]
    fn test_detect_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("calls.vcf");
        std::fs::create_dir(&sub).unwrap();
        let err = Detector::default().detect(&sub, None).unwrap_err();
        assert!(matches!(err, GenomeAiError::FileNotFound(_)));
    }

    #[test]
    fn test_detect_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.fasta", b"");
        let err = Detector::default().detect(&path, None).unwrap_err();
        assert!(matches!(err, GenomeAiError::Empty(_)));
    }

    #[test]
    fn test_detect_too_large() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "big.csv", b"a,b,c\n1,2,3\n");
        let err = Detector::new(4).detect(&path, None).unwrap_err();
        assert!(matches!(err, GenomeAiError::TooLarge { size: 12, limit: 4 }));
    }

    #[test]
    fn test_classify_too_large_beats_unsupported() {
        let detector = Detector::new(10);
        let err = detector
            .classify(Path::new("x.unknownext"), ".unknownext", 11)
            .unwrap_err();
        assert_eq!(err.code(), "FILE_TOO_LARGE");
    }
}
