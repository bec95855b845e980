//! Format catalog
//!
//! Static table of recognized formats and their structural markers. Lookups
//! walk the table in declaration order and the first matching entry wins, so
//! `.txt` resolves to TSV because TSV is declared first.

use genomeai_common::FormatId;
use serde::Serialize;
use tracing::warn;

/// Catalog entry for one format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatSpec {
    pub id: FormatId,

    /// Lower-case suffixes including the leading dot
    pub extensions: &'static [&'static str],

    /// MIME types an upload front end may report for this format
    pub mime_types: &'static [&'static str],

    /// Required literal prefix of the first content line
    pub header_prefix: Option<&'static str>,

    /// Field separator used by structural checks
    pub delimiter: Option<char>,
}

const TEXT_PLAIN: &str = "text/plain";

/// All supported formats, in lookup order
pub static CATALOG: [FormatSpec; 11] = [
    FormatSpec {
        id: FormatId::Csv,
        extensions: &[".csv"],
        mime_types: &["text/csv", "application/vnd.ms-excel"],
        header_prefix: None,
        delimiter: Some(','),
    },
    FormatSpec {
        id: FormatId::Tsv,
        extensions: &[".tsv", ".txt"],
        mime_types: &["text/tab-separated-values", TEXT_PLAIN],
        header_prefix: None,
        delimiter: Some('\t'),
    },
    FormatSpec {
        id: FormatId::Xlsx,
        extensions: &[".xlsx"],
        mime_types: &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"],
        header_prefix: None,
        delimiter: None,
    },
    FormatSpec {
        id: FormatId::Vcf,
        extensions: &[".vcf"],
        mime_types: &[TEXT_PLAIN],
        header_prefix: Some("##fileformat=VCF"),
        delimiter: Some('\t'),
    },
    FormatSpec {
        id: FormatId::Fasta,
        extensions: &[".fasta", ".fa"],
        mime_types: &[TEXT_PLAIN],
        header_prefix: Some(">"),
        delimiter: None,
    },
    FormatSpec {
        id: FormatId::Fastq,
        extensions: &[".fastq", ".fq"],
        mime_types: &[TEXT_PLAIN],
        header_prefix: Some("@"),
        delimiter: None,
    },
    FormatSpec {
        id: FormatId::Bed,
        extensions: &[".bed"],
        mime_types: &[TEXT_PLAIN],
        header_prefix: None,
        delimiter: Some('\t'),
    },
    FormatSpec {
        id: FormatId::Gff,
        extensions: &[".gff", ".gff3"],
        mime_types: &[TEXT_PLAIN],
        header_prefix: Some("##gff-version"),
        delimiter: Some('\t'),
    },
    FormatSpec {
        id: FormatId::Gtf,
        extensions: &[".gtf"],
        mime_types: &[TEXT_PLAIN],
        header_prefix: None,
        delimiter: Some('\t'),
    },
    FormatSpec {
        id: FormatId::Sam,
        extensions: &[".sam"],
        mime_types: &[TEXT_PLAIN],
        header_prefix: Some("@HD"),
        delimiter: Some('\t'),
    },
    FormatSpec {
        id: FormatId::Bam,
        extensions: &[".bam"],
        mime_types: &["application/octet-stream"],
        header_prefix: None,
        delimiter: None,
    },
];

/// Normalize an extension to lower case with a leading dot
///
/// Accepts either `"VCF"`, `".vcf"` or a bare file name such as `"calls.VCF"`.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let suffix = match trimmed.rfind('.') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };
    format!(".{}", suffix.to_ascii_lowercase())
}

/// Find the first catalog entry claiming an extension
pub fn lookup_extension(extension: &str) -> Option<&'static FormatSpec> {
    let normalized = normalize_extension(extension);
    CATALOG
        .iter()
        .find(|spec| spec.extensions.contains(&normalized.as_str()))
}

/// Catalog entry for a format id
pub fn spec_for(id: FormatId) -> &'static FormatSpec {
    // Every FormatId has exactly one entry; the fallback is unreachable
    // unless the table and the enum drift apart.
    CATALOG
        .iter()
        .find(|spec| spec.id == id)
        .unwrap_or(&CATALOG[0])
}

/// Every extension the catalog accepts, in lookup order
pub fn supported_extensions() -> Vec<&'static str> {
    CATALOG
        .iter()
        .flat_map(|spec| spec.extensions.iter().copied())
        .collect()
}

/// Check a caller-reported MIME type against a format's accepted hints.
///
/// Upload clients are unreliable about MIME types, so a mismatch is only
/// logged; parameters such as `charset` are ignored. Unparseable hints count
/// as a mismatch.
pub fn mime_hint_matches(id: FormatId, hint: &str) -> bool {
    let spec = spec_for(id);
    let matched = match hint.parse::<mime::Mime>() {
        Ok(parsed) => spec
            .mime_types
            .iter()
            .any(|accepted| parsed.essence_str().eq_ignore_ascii_case(accepted)),
        Err(_) => false,
    };

    if !matched {
        warn!(format = %id, mime = %hint, "Unexpected MIME type for format");
    }
    matched
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_format_appears_exactly_once() {
        let ids: Vec<FormatId> = CATALOG.iter().map(|spec| spec.id).collect();
        let unique: HashSet<FormatId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(unique.len(), FormatId::ALL.len());
        assert_eq!(ids, FormatId::ALL.to_vec());
    }

    #[test]
    fn test_extensions_are_normalized() {
        for spec in CATALOG.iter() {
            for ext in spec.extensions {
                assert!(ext.starts_with('.'), "{ext} lacks a leading dot");
                assert_eq!(*ext, ext.to_ascii_lowercase());
            }
        }
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("VCF"), ".vcf");
        assert_eq!(normalize_extension(".Fa"), ".fa");
        assert_eq!(normalize_extension("sample.GFF3"), ".gff3");
        assert_eq!(normalize_extension("archive.vcf.gz"), ".gz");
        assert_eq!(normalize_extension(""), "");
    }

    #[test]
    fn test_lookup_extension() {
        assert_eq!(lookup_extension(".vcf").unwrap().id, FormatId::Vcf);
        assert_eq!(lookup_extension("FQ").unwrap().id, FormatId::Fastq);
        assert_eq!(lookup_extension(".txt").unwrap().id, FormatId::Tsv);
        assert!(lookup_extension(".docx").is_none());
    }

    #[test]
    fn test_spec_for_returns_matching_entry() {
        for id in FormatId::ALL {
            assert_eq!(spec_for(id).id, id);
        }
        assert_eq!(spec_for(FormatId::Sam).header_prefix, Some("@HD"));
    }

    #[test]
    fn test_mime_hint_matches() {
        assert!(mime_hint_matches(FormatId::Csv, "text/csv"));
        assert!(mime_hint_matches(FormatId::Vcf, "text/plain; charset=utf-8"));
        assert!(!mime_hint_matches(FormatId::Bam, "text/plain"));
        assert!(!mime_hint_matches(FormatId::Fasta, "not a mime"));
    }

    #[test]
    fn test_supported_extensions_lists_all() {
        let extensions = supported_extensions();
        assert!(extensions.contains(&".gff3"));
        assert!(extensions.contains(&".bam"));
        assert_eq!(extensions.first(), Some(&".csv"));
    }
}
