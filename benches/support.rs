//! Shared helpers for benchmarks

use std::io::Write;

use logview::{PageStore, ViewerConfig};
use tempfile::NamedTempFile;

const LEVELS: [&str; 4] = ["info", "debug", "warn", "error"];

/// Write a JSON-lines log with `records` entries
#[allow(dead_code)]
pub fn make_log(records: usize) -> NamedTempFile {
    let mut temp = NamedTempFile::new().expect("create temp log");
    {
        let mut out = std::io::BufWriter::new(temp.as_file_mut());
        for i in 0..records {
            writeln!(
                out,
                r#"{{"ts":"2024-03-01T12:{:02}:{:02}Z","seq":{},"level":"{}","msg":"request {} served","latency_ms":{}}}"#,
                (i / 60) % 60,
                i % 60,
                i,
                LEVELS[i % LEVELS.len()],
                i,
                i % 997
            )
            .expect("write record");
        }
        out.flush().expect("flush log");
    }
    temp
}

/// Store with `file` loaded and all background work finished
#[allow(dead_code)]
pub fn make_store(file: &NamedTempFile, page_size: usize, large_file_threshold: usize) -> PageStore {
    let mut store = PageStore::new(ViewerConfig {
        page_size,
        large_file_threshold,
        ..ViewerConfig::default()
    });
    store.load(file.path()).expect("load log");
    store.wait_until_loaded().expect("settle log");
    store
}
