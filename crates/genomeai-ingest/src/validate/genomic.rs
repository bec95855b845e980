//! Genomic text checks (VCF, FASTA, FASTQ)

use super::text::LossyLines;
use super::Passed;
use genomeai_common::{FormatId, GenomeAiError, Result};
use std::collections::HashSet;
use std::path::Path;

/// Non-meta lines searched for the VCF column header
pub const VCF_HEADER_SEARCH_LINES: usize = 100;

/// Upper bound on `##` meta lines skipped before giving up.
///
/// Meta lines do not count toward [`VCF_HEADER_SEARCH_LINES`], but assemblies
/// with very many contigs still have to stay well under this.
pub const VCF_META_LINE_LIMIT: usize = 1_000_000;

/// Columns the VCF `#CHROM` header line must carry
pub const VCF_REQUIRED_COLUMNS: [&str; 8] =
    ["#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];

/// Non-blank lines scanned when counting sequence records
pub const SEQUENCE_SCAN_LINES: usize = 1000;

pub(crate) fn check_vcf(path: &Path) -> Result<Passed> {
    let mut meta_lines = 0;
    let mut searched = 0;

    for line in LossyLines::open(path)? {
        let line = line?;
        let line = line.trim();

        if line.starts_with("##") {
            meta_lines += 1;
            if meta_lines >= VCF_META_LINE_LIMIT {
                break;
            }
            continue;
        }

        if line.starts_with("#CHROM") {
            let columns: HashSet<&str> = line.split('\t').map(str::trim).collect();
            let missing: Vec<&str> = VCF_REQUIRED_COLUMNS
                .iter()
                .copied()
                .filter(|column| !columns.contains(column))
                .collect();

            if !missing.is_empty() {
                return Err(GenomeAiError::content_invalid(
                    FormatId::Vcf,
                    format!("missing required columns: {}", missing.join(", ")),
                ));
            }
            return Ok(Passed::ok(FormatId::Vcf));
        }

        searched += 1;
        if searched >= VCF_HEADER_SEARCH_LINES {
            break;
        }
    }

    Err(GenomeAiError::content_invalid(
        FormatId::Vcf,
        format!(
            "missing required header line (#CHROM...) within the first {} lines after meta-information",
            VCF_HEADER_SEARCH_LINES
        ),
    ))
}

/// Count record markers over the first [`SEQUENCE_SCAN_LINES`] non-blank lines.
///
/// FASTQ quality strings may themselves start with `@`, so the count is an
/// estimate rather than an exact read total.
pub(crate) fn check_sequences(path: &Path, format: FormatId, marker: char) -> Result<Passed> {
    let mut scanned = 0;
    let mut sequences = 0;

    for line in LossyLines::open(path)? {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with(marker) {
            sequences += 1;
        }
        scanned += 1;
        if scanned >= SEQUENCE_SCAN_LINES {
            break;
        }
    }

    if sequences == 0 {
        return Err(GenomeAiError::content_invalid(
            format,
            format!(
                "no {} sequences found in the first {} lines",
                format.label(),
                SEQUENCE_SCAN_LINES
            ),
        ));
    }

    Ok(Passed {
        format,
        reason: format!("ok ({} {} sequences found)", sequences, format.label()),
        record_count: Some(sequences),
    })
}
