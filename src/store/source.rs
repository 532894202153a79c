//! Page sources: where the store gets records from
//!
//! `ResidentSource` keeps every record in memory and serves slices of it;
//! `PrefetchCache` (see `cache.rs`) streams pages from disk. The store picks
//! one per loaded file.

use std::thread::{self, JoinHandle};

use super::cache::PrefetchCache;
use super::cursor::FileCursor;
use super::error::StoreError;
use super::navigation::PageWindow;
use super::page::{Page, PageRole};
use super::query::{filter_records, sort_records, FilterCriterion, SortState};
use super::record::Record;

/// Strategy for producing pages of the current file
pub trait PageSource: Send {
    /// Serve `window`, reached by navigating with `role`
    fn fetch(&mut self, role: PageRole, window: &PageWindow) -> Result<Page, StoreError>;

    /// Serve `window` again without a navigation step (after a resize)
    fn refetch(&mut self, window: &PageWindow) -> Result<Page, StoreError>;

    /// Rebuild any cached pages for a new page size
    fn repopulate(&mut self, _page_size: usize) -> Result<(), StoreError> {
        Ok(())
    }

    /// Wait for background work, re-raising its failure
    fn settle(&mut self) -> Result<(), StoreError>;

    /// Whether initial ingestion is still running
    fn is_reading(&self) -> bool;

    fn as_resident(&self) -> Option<&ResidentSource> {
        None
    }

    fn as_prefetch(&self) -> Option<&PrefetchCache> {
        None
    }

    fn as_resident_mut(&mut self) -> Option<&mut ResidentSource> {
        None
    }

    fn as_prefetch_mut(&mut self) -> Option<&mut PrefetchCache> {
        None
    }
}

type IngestHandle = JoinHandle<Result<Vec<Record>, StoreError>>;

/// Every record of the file held in memory
///
/// Loading parses the head of the file up front and the rest on one
/// background thread. `all` is file order; `view` is the sorted/filtered
/// sequence pages are sliced from.
pub struct ResidentSource {
    all: Vec<Record>,
    view: Vec<Record>,
    ingestion: Option<IngestHandle>,
}

impl ResidentSource {
    /// Build from records already in memory
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            view: records.clone(),
            all: records,
            ingestion: None,
        }
    }

    /// Parse the first `eager` records now, the rest of `total` in the background
    pub fn ingest(mut cursor: FileCursor, total: usize, eager: usize) -> Result<Self, StoreError> {
        let head = cursor.read_range(0, eager.min(total))?;
        let head_len = head.len();
        let mut source = Self::from_records(head.records);

        if head_len < total {
            let handle = thread::Builder::new()
                .name("logview-ingest".to_string())
                .spawn(move || {
                    let tail = cursor.read_range(head_len, total - head_len)?;
                    tracing::debug!(records = tail.len(), "background ingestion finished");
                    Ok(tail.records)
                })
                .map_err(StoreError::io)?;
            source.ingestion = Some(handle);
        }

        Ok(source)
    }

    /// Records in view order
    pub fn records(&self) -> &[Record] {
        &self.view
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Records before any filter, in file order
    pub fn unfiltered_len(&self) -> usize {
        self.all.len()
    }

    /// Rebuild the view from the full set: filter, then sort, then reverse
    ///
    /// Always starting from file order keeps the result independent of the
    /// order operations were applied in.
    pub fn arrange(&mut self, criteria: &[FilterCriterion], sort: &SortState, reversed: bool) {
        let mut view = filter_records(&self.all, criteria);
        if let Some(column) = &sort.column {
            view = sort_records(view, column, sort.ascending);
        }
        if reversed {
            view.reverse();
        }
        self.view = view;
    }

    fn slice(&self, window: &PageWindow) -> Page {
        let len = self.view.len();
        let start = window.start.min(len);
        let end = window.end().min(len);
        Page::new(start, self.view[start..end].to_vec())
    }

    fn finish_ingestion(&mut self) -> Result<(), StoreError> {
        let Some(handle) = self.ingestion.take() else {
            return Ok(());
        };

        let tail = handle
            .join()
            .map_err(|_| StoreError::Background("ingestion thread panicked".to_string()))??;

        // Sort and filter settle first, so the view is still the file-order prefix
        self.view.extend(tail.iter().cloned());
        self.all.extend(tail);
        Ok(())
    }
}

impl PageSource for ResidentSource {
    fn fetch(&mut self, _role: PageRole, window: &PageWindow) -> Result<Page, StoreError> {
        self.refetch(window)
    }

    fn refetch(&mut self, window: &PageWindow) -> Result<Page, StoreError> {
        if window.end() > self.view.len() {
            self.finish_ingestion()?;
        }
        Ok(self.slice(window))
    }

    fn settle(&mut self) -> Result<(), StoreError> {
        self.finish_ingestion()
    }

    fn is_reading(&self) -> bool {
        self.ingestion.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn as_resident(&self) -> Option<&ResidentSource> {
        Some(self)
    }

    fn as_resident_mut(&mut self) -> Option<&mut ResidentSource> {
        Some(self)
    }
}

impl Drop for ResidentSource {
    fn drop(&mut self) {
        if let Some(handle) = self.ingestion.take() {
            let _ = handle.join();
        }
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
            writeln!(temp, r#"{{"seq":{}}}"#, i).unwrap();
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
    fn test_ingest_serves_head_and_tail() {
        let temp = log_file(100);
        let mut source = ResidentSource::ingest(FileCursor::new(temp.path()), 100, 20).unwrap();

        let mut window = PageWindow::new(100, 10);
        let page = source.fetch(PageRole::First, &window).unwrap();
        assert_eq!(seqs(&page), (0..10).collect::<Vec<_>>());

        window.navigate(PageRole::Last);
        let page = source.fetch(PageRole::Last, &window).unwrap();
        assert_eq!(seqs(&page), (90..100).collect::<Vec<_>>());

        assert!(!source.is_reading());
        assert_eq!(source.len(), 100);
    }

    #[test]
    fn test_ingest_small_file_has_no_background_task() {
        let temp = log_file(5);
        let source = ResidentSource::ingest(FileCursor::new(temp.path()), 5, 20).unwrap();
        assert!(source.ingestion.is_none());
        assert_eq!(source.len(), 5);
    }

    #[test]
    fn test_ingest_error_surfaces_on_settle() {
        let mut temp = NamedTempFile::new().unwrap();
        for i in 0..10 {
            writeln!(temp, r#"{{"seq":{}}}"#, i).unwrap();
        }
        writeln!(temp, "{{broken").unwrap();
        temp.flush().unwrap();

        let mut source = ResidentSource::ingest(FileCursor::new(temp.path()), 11, 4).unwrap();
        let err = source.settle().unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord(ref e) if e.line == Some(11)));
    }

    #[test]
    fn test_slice_clamps_to_available_records() {
        let temp = log_file(5);
        let mut source = ResidentSource::ingest(FileCursor::new(temp.path()), 5, 5).unwrap();
        let window = PageWindow {
            start: 3,
            page_size: 10,
            user_page_size: 10,
            total: 13,
            default_start: 0,
        };
        let page = source.refetch(&window).unwrap();
        assert!(page.covers(3, 2));
    }

    #[test]
    fn test_filter_then_clear_keeps_sort() {
        let temp = log_file(10);
        let mut source = ResidentSource::ingest(FileCursor::new(temp.path()), 10, 10).unwrap();
        let sort = SortState {
            column: Some("seq".to_string()),
            ascending: false,
        };

        source.arrange(&[FilterCriterion::new("seq", "1")], &sort, false);
        assert_eq!(source.len(), 1);
        assert_eq!(source.unfiltered_len(), 10);

        source.arrange(&[], &sort, false);
        let window = PageWindow::new(10, 3);
        let page = source.refetch(&window).unwrap();
        assert_eq!(seqs(&page), vec![9, 8, 7]);
    }

    fn resident(lines: &[&str]) -> ResidentSource {
        ResidentSource::from_records(
            lines
                .iter()
                .map(|l| crate::store::record::parse_record(l, None).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_reverse() {
        let mut source = resident(&[
            r#"{"seq":0}"#,
            r#"{"seq":1}"#,
            r#"{"seq":2}"#,
            r#"{"seq":3}"#,
        ]);
        source.arrange(&[], &SortState::default(), true);
        let page = source.refetch(&PageWindow::new(4, 4)).unwrap();
        assert_eq!(seqs(&page), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_reversal_survives_filter() {
        let mut source = resident(&[
            r#"{"seq":0,"level":"warn"}"#,
            r#"{"seq":1,"level":"info"}"#,
            r#"{"seq":2,"level":"warn"}"#,
            r#"{"seq":3,"level":"warn"}"#,
        ]);
        let unsorted = SortState::default();
        source.arrange(&[FilterCriterion::new("level", "warn")], &unsorted, true);
        let page = source.refetch(&PageWindow::new(3, 3)).unwrap();
        assert_eq!(seqs(&page), vec![3, 2, 0]);

        source.arrange(&[], &unsorted, true);
        let page = source.refetch(&PageWindow::new(4, 4)).unwrap();
        assert_eq!(seqs(&page), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_sort_keeps_file_order_for_missing_column_after_reverse() {
        let mut source = resident(&[
            r#"{"seq":0}"#,
            r#"{"seq":1,"level":"warn"}"#,
            r#"{"seq":2}"#,
            r#"{"seq":3,"level":"info"}"#,
        ]);
        source.arrange(&[], &SortState::default(), true);

        let sort = SortState {
            column: Some("level".to_string()),
            ascending: true,
        };
        source.arrange(&[], &sort, false);
        let page = source.refetch(&PageWindow::new(4, 4)).unwrap();
        assert_eq!(seqs(&page), vec![3, 1, 0, 2]);
    }
}
