//! Delimited text checks (CSV, TSV)

use super::text::{read_first_line, read_sample};
use super::Passed;
use genomeai_common::{FormatId, GenomeAiError, Result};
use std::path::Path;

/// Bytes sampled from the head of a CSV file for dialect sniffing
pub const CSV_SAMPLE_BYTES: usize = 1024;

/// Delimiters tried by the sniffer, most preferred first
const CANDIDATE_DELIMITERS: [u8; 6] = [b',', b'\t', b';', b' ', b':', b'|'];

/// Share of sampled lines that must agree on a delimiter count
const CONSISTENCY_THRESHOLD: f64 = 0.9;

pub(crate) fn check_csv(path: &Path) -> Result<Passed> {
    let sample = read_sample(path, CSV_SAMPLE_BYTES)?;

    let delimiter = sniff_delimiter(&sample.text, sample.truncated).ok_or_else(|| {
        GenomeAiError::content_invalid(FormatId::Csv, "CSV format error: could not determine delimiter")
    })?;

    first_row(&sample.text, sample.truncated, delimiter)
}

/// Parse the first row of the sample without reading past it
fn first_row(text: &str, truncated: bool, delimiter: u8) -> Result<Passed> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut row = csv::ByteRecord::new();

    match reader.read_byte_record(&mut row) {
        Ok(true) if truncated && reader.position().byte() as usize >= text.len() && open_quote(text) => {
            Err(GenomeAiError::content_invalid(
                FormatId::Csv,
                format!(
                    "CSV format error: unterminated quoted field in the first {} bytes",
                    CSV_SAMPLE_BYTES
                ),
            ))
        },
        Ok(true) if row.iter().any(|field| !field.is_empty()) => Ok(Passed::ok(FormatId::Csv)),
        Ok(_) => Err(GenomeAiError::content_invalid(
            FormatId::Csv,
            "CSV file appears to be empty or malformed",
        )),
        Err(e) => {
            let message = e.to_string();
            match e.into_kind() {
                csv::ErrorKind::Io(io) => Err(GenomeAiError::Io(io)),
                _ => Err(GenomeAiError::content_invalid(
                    FormatId::Csv,
                    format!("CSV format error: {}", message),
                )),
            }
        },
    }
}

pub(crate) fn check_tsv(path: &Path) -> Result<Passed> {
    let first_line = read_first_line(path)?;
    let first_line = first_line.trim();

    if first_line.is_empty() {
        return Err(GenomeAiError::content_invalid(
            FormatId::Tsv,
            "TSV file appears to be empty",
        ));
    }
    if !first_line.contains('\t') {
        return Err(GenomeAiError::content_invalid(
            FormatId::Tsv,
            "TSV file does not contain tab separators",
        ));
    }

    Ok(Passed::ok(FormatId::Tsv))
}

/// Infer a delimiter from a text sample.
///
/// A candidate qualifies when it occurs, outside quotes, the same nonzero
/// number of times on at least 90% of the sampled lines. The first
/// qualifying candidate in preference order wins. When `truncated` is set the
/// last line is assumed cut short and ignored, unless it is the only one.
pub fn sniff_delimiter(sample: &str, truncated: bool) -> Option<u8> {
    let mut lines: Vec<&str> = sample.lines().collect();
    if truncated && lines.len() > 1 {
        lines.pop();
    }
    lines.retain(|line| !line.trim().is_empty());
    if lines.is_empty() {
        return None;
    }

    CANDIDATE_DELIMITERS.into_iter().find(|&delimiter| {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_unquoted(line, delimiter))
            .collect();
        match modal_count(&counts) {
            Some((count, frequency)) if count > 0 => {
                frequency as f64 / lines.len() as f64 >= CONSISTENCY_THRESHOLD
            },
            _ => false,
        }
    })
}

fn open_quote(text: &str) -> bool {
    text.bytes().filter(|&b| b == b'"').count() % 2 == 1
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Most frequent value and how often it occurs; ties go to the larger value
fn modal_count(counts: &[usize]) -> Option<(usize, usize)> {
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for &count in counts {
        match tally.iter_mut().find(|(value, _)| *value == count) {
            Some((_, frequency)) => *frequency += 1,
            None => tally.push((count, 1)),
        }
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_comma() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n4,5,6\n", false), Some(b','));
    }

    #[test]
    fn test_sniff_semicolon() {
        assert_eq!(sniff_delimiter("gene;score\nBRCA1;0.9\nTP53;0.7\n", false), Some(b';'));
    }

    #[test]
    fn test_sniff_ignores_quoted_delimiters() {
        let sample = "\"name, full\";id\n\"Doe, Jane\";1\n\"Roe, Rick\";2\n";
        assert_eq!(sniff_delimiter(sample, false), Some(b';'));
    }

    #[test]
    fn test_sniff_single_column_fails() {
        assert_eq!(sniff_delimiter("justoneword\n", false), None);
        assert_eq!(sniff_delimiter("", false), None);
    }

    #[test]
    fn test_sniff_drops_partial_last_line() {
        assert_eq!(sniff_delimiter("a,b\n1,2\n3,", true), Some(b','));
    }

    #[test]
    fn test_sniff_inconsistent_counts_fail() {
        let sample = "a,b\nc,d,e,f\ng\nh,i,j\n";
        assert_eq!(sniff_delimiter(sample, false), None);
    }

    fn csv_file(content: &[u8]) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    /// Lines of `width` bytes (newline included) with two commas each
    fn wide_rows(rows: usize, width: usize) -> String {
        let cell = "x".repeat((width - 3) / 3);
        let row = format!("{cell},{cell},{cell}");
        let row = format!("{:<pad$}\n", row, pad = width - 1);
        row.repeat(rows)
    }

    #[test]
    fn test_csv_with_bom_matches_plain_csv() {
        let rows = wide_rows(8, 244);
        assert!(rows.len() > CSV_SAMPLE_BYTES);

        let plain = csv_file(rows.as_bytes());
        assert!(check_csv(plain.path()).is_ok());

        let with_bom = csv_file(format!("\u{feff}{rows}").as_bytes());
        let passed = check_csv(with_bom.path()).unwrap();
        assert_eq!(passed.format, FormatId::Csv);
    }

    #[test]
    fn test_csv_unclosed_quote_is_not_read_to_eof() {
        let mut content = b"\"gene,score\n".to_vec();
        content.extend(b"1,2\n".repeat(512 * 1024));
        let file = csv_file(&content);

        let err = check_csv(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONTENT_INVALID");
        assert!(err.to_string().contains("CSV format error"));
    }

    #[test]
    fn test_first_row_longer_than_sample_passes() {
        let header = vec!["column"; 300].join(",");
        assert!(header.len() > CSV_SAMPLE_BYTES);
        let sample = &header[..CSV_SAMPLE_BYTES];
        assert!(first_row(sample, true, b',').is_ok());
    }

    #[test]
    fn test_first_row_empty_fields_fail() {
        let err = first_row(",,\n", false, b',').unwrap_err();
        assert!(err.to_string().contains("appears to be empty or malformed"));
    }

    #[test]
    fn test_modal_count() {
        assert_eq!(modal_count(&[2, 2, 3]), Some((2, 2)));
        assert_eq!(modal_count(&[]), None);
    }
}
