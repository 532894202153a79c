//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

use logview::store::Page;
use logview::{PageStore, ViewerConfig};

pub const LEVELS: [&str; 4] = ["info", "debug", "warn", "error"];

/// Write `lines` as a temp JSON-lines file
pub fn write_log(lines: &[String]) -> NamedTempFile {
    let mut temp = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(temp, "{}", line).unwrap();
    }
    temp.flush().unwrap();
    temp
}

/// Record `i` of the standard fixture: `{"seq":i,"level":...,"msg":...}`
pub fn record_line(i: usize) -> String {
    format!(
        r#"{{"seq":{},"level":"{}","msg":"event {}"}}"#,
        i,
        LEVELS[i % LEVELS.len()],
        i
    )
}

/// Temp file with `count` fixture records
pub fn log_with_records(count: usize) -> NamedTempFile {
    let lines: Vec<String> = (0..count).map(record_line).collect();
    write_log(&lines)
}

/// Store config with the given page size and large-file threshold
pub fn config(page_size: usize, large_file_threshold: usize) -> ViewerConfig {
    ViewerConfig {
        page_size,
        large_file_threshold,
        ..ViewerConfig::default()
    }
}

/// Store with `file` loaded and settled
pub fn loaded_store(file: &NamedTempFile, config: ViewerConfig) -> PageStore {
    let mut store = PageStore::new(config);
    store.load(file.path()).unwrap();
    store.wait_until_loaded().unwrap();
    store
}

/// `seq` values on a page, in order
pub fn seqs(page: &Page) -> Vec<u64> {
    page.iter()
        .map(|r| r.get("seq").and_then(|v| v.as_u64()).unwrap())
        .collect()
}

pub fn range(start: u64, end: u64) -> Vec<u64> {
    (start..end).collect()
}
