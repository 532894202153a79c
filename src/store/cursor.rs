//! Forward-only record reader over a log file
//!
//! The cursor keeps one open read position and the logical record index it
//! sits at. Reading behind that index means starting over from the top of
//! the file, so callers should prefer ascending reads.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::error::StoreError;
use super::page::Page;
use super::record::{parse_record, ParseError, Record};
use crate::util::FileOpenError;

pub struct FileCursor {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    /// Records consumed since the last reset
    offset: usize,
    /// Physical lines consumed since the last reset (blank lines included)
    line_number: usize,
    /// Raw bytes of the current line; only decoded when parsed
    line: Vec<u8>,
}

impl FileCursor {
    /// Create a cursor for `path`; the file is opened lazily
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: None,
            offset: 0,
            line_number: 0,
            line: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical record index the read position is at
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Open the file if it is not open yet
    pub fn ensure_open(&mut self) -> Result<(), StoreError> {
        if self.reader.is_none() {
            let file = File::open(&self.path)
                .map_err(|e| StoreError::FileAccess(FileOpenError::from_io(&e)))?;
            self.reader = Some(BufReader::new(file));
            self.offset = 0;
            self.line_number = 0;
        }
        Ok(())
    }

    /// Close and reopen at the start of the file
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.close();
        self.ensure_open()
    }

    /// Release the file handle
    pub fn close(&mut self) {
        self.reader = None;
        self.offset = 0;
        self.line_number = 0;
    }

    /// Read up to `count` records starting at logical index `start`
    ///
    /// The returned page is shorter than `count` when the file ends first.
    pub fn read_range(&mut self, start: usize, count: usize) -> Result<Page, StoreError> {
        self.ensure_open()?;

        if self.offset > start {
            tracing::debug!(
                offset = self.offset,
                start,
                "cursor past requested start, reopening {}",
                self.path.display()
            );
            self.reset()?;
        }

        while self.offset < start {
            if !self.advance()? {
                return Ok(Page::empty(start));
            }
        }

        let mut records = Vec::with_capacity(count);
        while records.len() < count {
            if !self.advance()? {
                break;
            }
            records.push(self.parse_line()?);
        }

        Ok(Page::new(start, records))
    }

    /// Count records from the start of the file
    ///
    /// Stops early once `limit` records were seen. The cursor is left
    /// positioned after the last counted record.
    pub fn count_records(&mut self, limit: Option<usize>) -> Result<usize, StoreError> {
        self.reset()?;
        let limit = limit.unwrap_or(usize::MAX);

        while self.offset < limit {
            if !self.advance()? {
                break;
            }
        }

        Ok(self.offset)
    }

    /// Move past the next record line, leaving its text in `self.line`.
    ///
    /// Returns `false` at end of file.
    fn advance(&mut self) -> Result<bool, StoreError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(false);
        };

        loop {
            self.line.clear();
            let read = reader
                .read_until(b'\n', &mut self.line)
                .map_err(StoreError::io)?;
            if read == 0 {
                return Ok(false);
            }
            self.line_number += 1;
            if !self.line.iter().all(u8::is_ascii_whitespace) {
                self.offset += 1;
                return Ok(true);
            }
        }
    }

    /// Decode and parse the current line
    fn parse_line(&self) -> Result<Record, StoreError> {
        let text = std::str::from_utf8(&self.line).map_err(|e| ParseError {
            message: format!("invalid UTF-8: {}", e),
            line: Some(self.line_number),
        })?;
        Ok(parse_record(text.trim(), Some(self.line_number))?)
    }
}

impl std::fmt::Debug for FileCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCursor")
            .field("path", &self.path)
            .field("open", &self.reader.is_some())
            .field("offset", &self.offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_file(lines: usize) -> NamedTempFile {
        let mut temp = NamedTempFile::new().unwrap();
        for i in 0..lines {
            writeln!(temp, r#"{{"seq":{},"msg":"line {}"}}"#, i, i).unwrap();
        }
        temp.flush().unwrap();
        temp
    }

    fn seqs(page: &Page) -> Vec<u64> {
        page.iter()
            .map(|r| r.get("seq").and_then(|v| v.as_u64()).unwrap())
            .collect()
    }

    #[test]
    fn test_count_records() {
        let temp = log_file(37);
        let mut cursor = FileCursor::new(temp.path());
        assert_eq!(cursor.count_records(None).unwrap(), 37);
        assert_eq!(cursor.offset(), 37);
    }

    #[test]
    fn test_count_records_with_limit() {
        let temp = log_file(37);
        let mut cursor = FileCursor::new(temp.path());
        assert_eq!(cursor.count_records(Some(10)).unwrap(), 10);
        assert_eq!(cursor.count_records(Some(100)).unwrap(), 37);
    }

    #[test]
    fn test_read_range_forward() {
        let temp = log_file(30);
        let mut cursor = FileCursor::new(temp.path());

        let page = cursor.read_range(0, 10).unwrap();
        assert_eq!(seqs(&page), (0..10).collect::<Vec<_>>());
        assert_eq!(cursor.offset(), 10);

        let page = cursor.read_range(15, 5).unwrap();
        assert_eq!(page.start, 15);
        assert_eq!(seqs(&page), (15..20).collect::<Vec<_>>());
        assert_eq!(cursor.offset(), 20);
    }

    #[test]
    fn test_read_range_backward_resets() {
        let temp = log_file(30);
        let mut cursor = FileCursor::new(temp.path());

        cursor.read_range(20, 5).unwrap();
        assert_eq!(cursor.offset(), 25);

        let page = cursor.read_range(3, 2).unwrap();
        assert_eq!(seqs(&page), vec![3, 4]);
        assert_eq!(cursor.offset(), 5);
    }

    #[test]
    fn test_read_range_short_at_eof() {
        let temp = log_file(12);
        let mut cursor = FileCursor::new(temp.path());

        let page = cursor.read_range(10, 5).unwrap();
        assert!(page.covers(10, 2));
        assert_eq!(cursor.offset(), 12);

        let page = cursor.read_range(40, 5).unwrap();
        assert!(page.covers(40, 0));
    }

    #[test]
    fn test_blank_lines_are_not_records() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{{\"seq\":0}}\n\n   \n{{\"seq\":1}}\n\r\n{{\"seq\":2}}").unwrap();
        temp.flush().unwrap();

        let mut cursor = FileCursor::new(temp.path());
        assert_eq!(cursor.count_records(None).unwrap(), 3);

        let page = cursor.read_range(1, 2).unwrap();
        assert_eq!(seqs(&page), vec![1, 2]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{{\"seq\":0}}\r\n{{\"seq\":1}}\r\n").unwrap();
        temp.flush().unwrap();

        let mut cursor = FileCursor::new(temp.path());
        let page = cursor.read_range(0, 5).unwrap();
        assert_eq!(seqs(&page), vec![0, 1]);
    }

    #[test]
    fn test_malformed_line_reports_physical_line() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{{\"seq\":0}}\n\n{{\"seq\":1,\n{{\"seq\":2}}\n").unwrap();
        temp.flush().unwrap();

        let mut cursor = FileCursor::new(temp.path());
        let err = cursor.read_range(0, 3).unwrap_err();
        match err {
            StoreError::MalformedRecord(e) => assert_eq!(e.line, Some(3)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_malformed_record_with_line() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"{\"seq\":0}\n{\"seq\":\"\xff\xfe\"}\n{\"seq\":2}\n")
            .unwrap();
        temp.flush().unwrap();

        let mut cursor = FileCursor::new(temp.path());
        assert_eq!(cursor.count_records(None).unwrap(), 3);

        // Skipping over the bad line only needs the byte scan
        let page = cursor.read_range(2, 1).unwrap();
        assert_eq!(seqs(&page), vec![2]);

        let err = cursor.read_range(0, 3).unwrap_err();
        match err {
            StoreError::MalformedRecord(e) => {
                assert_eq!(e.line, Some(2));
                assert!(e.message.starts_with("invalid UTF-8"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_skipping_does_not_parse() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "not json\n{{\"seq\":1}}\n").unwrap();
        temp.flush().unwrap();

        let mut cursor = FileCursor::new(temp.path());
        let page = cursor.read_range(1, 1).unwrap();
        assert_eq!(seqs(&page), vec![1]);
    }

    #[test]
    fn test_missing_file() {
        let mut cursor = FileCursor::new("/nonexistent/logview/app.jsonl");
        assert_eq!(
            cursor.ensure_open(),
            Err(StoreError::FileAccess(FileOpenError::NotFound))
        );
        assert!(!cursor.is_open());
    }

    #[test]
    fn test_close_releases_handle() {
        let temp = log_file(3);
        let mut cursor = FileCursor::new(temp.path());
        cursor.read_range(0, 2).unwrap();
        assert!(cursor.is_open());

        cursor.close();
        assert!(!cursor.is_open());
        assert_eq!(cursor.offset(), 0);
    }
}
