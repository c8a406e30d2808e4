//! Bounded line buffers over a log file.
//!
//! Every extraction phase asks for its own buffer: either the whole file (for
//! the section scan) or only the lines between two landmark lines. Each call
//! opens and reads the file again, so no phase depends on another phase's
//! read position.
//!
//! Lines are decoded lossily: bytes that are not valid UTF-8 (a Latin-1 run
//! title, a host name) become U+FFFD instead of failing the read.

use crate::line::TokenizedLine;
use std::fs::File;
use std::io::{BufRead, BufReader, Result};
use std::path::Path;

/// Range between two landmark lines of a section.
///
/// Both `start` and `end` are 0-based line numbers of the landmark lines
/// themselves; the section body is the lines strictly between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// Line number of the opening landmark
    pub start: usize,
    /// Line number of the closing landmark
    pub end: usize,
}

impl LineRange {
    /// Creates a range between two landmark lines.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of body lines (landmarks excluded)
    pub fn body_len(&self) -> usize {
        self.end.saturating_sub(self.start + 1)
    }
}

/// An ordered slice of tokenized lines loaded from a log file.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    lines: Vec<TokenizedLine>,
}

impl LineBuffer {
    /// Loads every line of the file at `path`.
    pub fn whole(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = Vec::new();
        for (number, raw) in LossyLines::new(reader).enumerate() {
            lines.push(TokenizedLine::new(number, &raw?));
        }
        Ok(Self { lines })
    }

    /// Loads only the body lines of `range` from the file at `path`.
    pub fn slice(path: &Path, range: LineRange) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = Vec::with_capacity(range.body_len());
        for (number, raw) in LossyLines::new(reader)
            .enumerate()
            .skip(range.start + 1)
            .take(range.body_len())
        {
            lines.push(TokenizedLine::new(number, &raw?));
        }
        Ok(Self { lines })
    }

    /// Builds a buffer from in-memory text, numbering lines from 0.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .enumerate()
                .map(|(number, raw)| TokenizedLine::new(number, raw))
                .collect(),
        }
    }

    /// Number of loaded lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when nothing was loaded
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Loaded lines in file order
    pub fn lines(&self) -> &[TokenizedLine] {
        &self.lines
    }
}

/// Line iterator that tolerates bytes outside UTF-8.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let mut end = self.buf.len();
                while end > 0 && matches!(self.buf[end - 1], b'\n' | b'\r') {
                    end -= 1;
                }
                Some(Ok(String::from_utf8_lossy(&self.buf[..end]).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_slice_excludes_landmarks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "start\na 1\nb 2\nend\ntail\n").unwrap();

        let buffer = LineBuffer::slice(file.path(), LineRange::new(0, 3)).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.lines()[0].token(0), Some("a"));
        assert_eq!(buffer.lines()[1].number(), 2);
    }

    #[test]
    fn test_empty_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "x\ny\n").unwrap();

        let buffer = LineBuffer::slice(file.path(), LineRange::new(1, 2)).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(LineRange::new(5, 2).body_len(), 0);
    }

    #[test]
    fn test_non_utf8_line_is_decoded_lossily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b" RUN TITLE: mol\xe9cule d'eau\r\n O 8.0 0.0 0.0 0.0\r\n")
            .unwrap();

        let buffer = LineBuffer::whole(file.path()).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.lines()[0].token(0), Some("RUN"));
        assert_eq!(buffer.lines()[1].len(), 5);
        assert_eq!(buffer.lines()[1].token(4), Some("0.0"));

        let body = LineBuffer::slice(file.path(), LineRange::new(0, 2)).unwrap();
        assert_eq!(body.lines()[0].token(0), Some("O"));
    }

    #[test]
    fn test_whole_numbers_lines() {
        let buffer = LineBuffer::from_text("one\n\nthree 3\n");
        assert_eq!(buffer.len(), 3);
        assert!(buffer.lines()[1].is_empty());
        assert_eq!(buffer.lines()[2].number(), 2);
    }
}
