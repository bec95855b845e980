//! Bounded, permissive text reading
//!
//! Biological text files routinely carry stray non-UTF-8 bytes in comments, so
//! everything here decodes lossily. Individual lines are capped so a file with
//! no newlines cannot make a validator buffer gigabytes.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Longest line prefix kept in memory; the rest of the line is skipped
pub const MAX_LINE_BYTES: usize = 64 * 1024;

const UTF8_BOM: char = '\u{feff}';

/// Read the first line of a file with a single bounded read
pub fn read_first_line(path: &Path) -> io::Result<String> {
    let mut lines = LossyLines::open(path)?;
    match lines.next() {
        Some(line) => line,
        None => Ok(String::new()),
    }
}

/// Head of a file, decoded lossily with any byte-order mark removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub text: String,

    /// The read filled the whole limit, so the last line may be cut short
    pub truncated: bool,
}

/// Read up to `limit` bytes from the start of a file
pub fn read_sample(path: &Path, limit: usize) -> io::Result<Sample> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(limit);
    file.take(limit as u64).read_to_end(&mut buf)?;
    let text = String::from_utf8_lossy(&buf);
    Ok(Sample {
        text: text.strip_prefix(UTF8_BOM).unwrap_or(&text).to_string(),
        truncated: buf.len() >= limit,
    })
}

/// Line iterator that never fails on invalid UTF-8.
///
/// Yields lines without their terminator. A leading byte-order mark on the
/// first line is dropped.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
    first: bool,
}

impl LossyLines<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            first: true,
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match read_capped_line(&mut self.reader, &mut self.buf, MAX_LINE_BYTES) {
            Ok(0) => None,
            Ok(_) => {
                let decoded = String::from_utf8_lossy(&self.buf);
                let mut line = decoded.trim_end_matches(['\n', '\r']);
                if std::mem::take(&mut self.first) {
                    line = line.strip_prefix(UTF8_BOM).unwrap_or(line);
                }
                Some(Ok(line.to_string()))
            },
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read one line into `buf`, keeping at most `cap` bytes of it.
///
/// Returns the number of bytes consumed from the reader, including the
/// skipped tail of an over-long line; zero means end of input.
fn read_capped_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, cap: usize) -> io::Result<usize> {
    let mut consumed = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(consumed);
        }

        let (used, done) = match available.iter().position(|&b| b == b'\n') {
            Some(idx) => (idx + 1, true),
            None => (available.len(), false),
        };
        let room = cap.saturating_sub(buf.len());
        buf.extend_from_slice(&available[..used.min(room)]);

        reader.consume(used);
        consumed += used;
        if done {
            return Ok(consumed);
        }
    }
}
