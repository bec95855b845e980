//! Content fingerprints for uploaded files
//!
//! SHA-256 over the full byte stream, read in fixed-size chunks so that
//! multi-gigabyte sequencing files never sit in memory. The digest is used for
//! integrity and dedup bookkeeping only, never as a record key.

use crate::error::{GenomeAiError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Read size for streaming digests
pub const CHUNK_SIZE: usize = 4096;

/// Compute the SHA-256 digest of a file as lower-case hex
pub fn digest_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path.as_ref())?;
    digest_reader(&mut file)
}

/// Compute the SHA-256 digest of any readable source
pub fn digest_reader<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 digest of in-memory bytes
pub fn digest_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Verify that a file still matches a previously recorded digest
pub fn verify_file_digest(path: impl AsRef<Path>, expected: &str) -> Result<()> {
    let path = path.as_ref();
    let actual = digest_file(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(GenomeAiError::ChecksumMismatch {
            path: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
