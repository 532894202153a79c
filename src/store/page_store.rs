//! The paginated log store
//!
//! `PageStore` is what a viewer holds: it loads a file, tracks the current
//! page window, and answers navigation, sort and filter commands by pulling
//! pages from a [`PageSource`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::cache::{CacheStats, PrefetchCache};
use super::cursor::FileCursor;
use super::error::StoreError;
use super::navigation::PageWindow;
use super::page::{Page, PageRole};
use super::query::{FilterCriterion, SortState};
use super::record::collect_columns;
use super::source::{PageSource, ResidentSource};
use crate::config::ViewerConfig;
use crate::util::validate_log_file;

/// Page sizes offered to the user, filtered by the record count
pub const PAGE_SIZE_OPTIONS: [usize; 7] = [50, 100, 200, 500, 1000, 5000, 10000];

/// Files at or below this many records are shown on a single fixed page size
const PAGE_SIZING_MIN_RECORDS: usize = 50;

pub struct PageStore {
    config: ViewerConfig,
    path: Option<PathBuf>,
    window: PageWindow,
    source: Option<Box<dyn PageSource>>,
    is_large_file: bool,
    is_partial_load: bool,
    /// Zero-based section being paged in partial-load mode
    section: usize,
    /// Records counted so far; a lower bound until `scan_exhausted`
    known_records: usize,
    scan_exhausted: bool,
    sort: SortState,
    reversed: bool,
    filters: Vec<FilterCriterion>,
    current: Page,
}

impl PageStore {
    pub fn new(config: ViewerConfig) -> Self {
        let config = config.sanitized();
        Self {
            window: PageWindow::new(0, config.page_size),
            config,
            path: None,
            source: None,
            is_large_file: false,
            is_partial_load: false,
            section: 0,
            known_records: 0,
            scan_exhausted: true,
            sort: SortState::default(),
            reversed: false,
            filters: Vec::new(),
            current: Page::default(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    // =====================================================================
    // Loading
    // =====================================================================

    /// Open `path` and prepare the first page
    ///
    /// On failure the store keeps whatever it had before the call.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let started = Instant::now();
        validate_log_file(path)?;

        let mut cursor = FileCursor::new(path);
        let scan_limit = self
            .config
            .partial_load
            .then(|| self.config.section_size.max(self.config.large_file_threshold) + 1);
        let counted = cursor.count_records(scan_limit)?;

        let is_large_file = counted > self.config.large_file_threshold;
        let is_partial_load =
            is_large_file && self.config.partial_load && counted > self.config.section_size;
        let total = if is_partial_load {
            self.config.section_size
        } else {
            counted
        };

        let page_size = self.window.user_page_size;
        let source: Box<dyn PageSource> = if is_large_file {
            Box::new(PrefetchCache::start(cursor, total, page_size)?)
        } else {
            Box::new(ResidentSource::ingest(cursor, total, 2 * page_size)?)
        };

        self.unload();
        self.source = Some(source);
        self.path = Some(path.to_path_buf());
        self.window = PageWindow::new(total, page_size);
        self.is_large_file = is_large_file;
        self.is_partial_load = is_partial_load;
        self.known_records = counted;
        self.scan_exhausted = scan_limit.map_or(true, |limit| counted < limit);

        tracing::info!(
            path = %path.display(),
            total,
            large = is_large_file,
            partial = is_partial_load,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded log file"
        );
        Ok(())
    }

    /// Drop the current file and return to the empty state
    pub fn unload(&mut self) {
        // Dropping the source joins its background task
        self.source = None;
        self.path = None;
        self.window = PageWindow::new(0, self.window.user_page_size);
        self.is_large_file = false;
        self.is_partial_load = false;
        self.section = 0;
        self.known_records = 0;
        self.scan_exhausted = true;
        self.sort = SortState::default();
        self.reversed = false;
        self.filters.clear();
        self.current = Page::default();
    }

    /// Block until background ingestion or cache population is done
    pub fn wait_until_loaded(&mut self) -> Result<(), StoreError> {
        let result = self.source_mut()?.settle();
        self.guard(result)
    }

    // =====================================================================
    // Navigation
    // =====================================================================

    /// Move to the page for `role` and return it
    ///
    /// `Previous` and `Next` re-serve the current page when there is
    /// nowhere to go.
    pub fn get_page(&mut self, role: PageRole) -> Result<Page, StoreError> {
        let source = self.source.as_mut().ok_or(StoreError::NotLoaded)?;

        if matches!(role, PageRole::Previous | PageRole::Next) && !self.window.has_page(role) {
            if self.current.covers(self.window.start, self.window.page_size) {
                let result = source.settle();
                self.guard(result)?;
                return Ok(self.current.clone());
            }
            let result = source.refetch(&self.window);
            let page = self.guard(result)?;
            self.current = page.clone();
            return Ok(page);
        }

        let mut window = self.window;
        window.navigate(role);
        let result = source.fetch(role, &window);
        let page = self.guard(result)?;

        tracing::debug!(%role, start = window.start, size = window.page_size, "page served");
        self.window = window;
        self.current = page.clone();
        Ok(page)
    }

    pub fn has_page(&self, role: PageRole) -> bool {
        if self.source.is_none() {
            return false;
        }
        if role == PageRole::Last && self.is_reading_file() {
            return false;
        }
        self.window.has_page(role)
    }

    /// Re-apply the configured page size at the current position
    pub fn resize_page(&mut self) -> Result<Page, StoreError> {
        let user_page_size = self.window.user_page_size;
        let source = self.source_mut()?;
        let result = source.repopulate(user_page_size);
        self.guard(result)?;

        let mut window = self.window;
        if !window.resize(user_page_size) {
            return self.get_page(PageRole::Last);
        }

        let result = self.source_mut()?.refetch(&window);
        let page = self.guard(result)?;
        self.window = window;
        self.current = page.clone();
        Ok(page)
    }

    /// Change the configured page size; re-pages the loaded file if any
    pub fn set_page_size(&mut self, page_size: usize) -> Result<Page, StoreError> {
        self.window.user_page_size = page_size.max(1);
        if self.source.is_none() {
            self.window = PageWindow::new(0, page_size);
            return Ok(Page::default());
        }
        self.resize_page()
    }

    // =====================================================================
    // Sections (partial-load mode only)
    // =====================================================================

    /// Page through section `index` (zero-based) of a partially loaded file
    ///
    /// Counts further into the file when the section lies past what has
    /// been scanned so far. Returns the section's first page.
    pub fn select_section(&mut self, index: usize) -> Result<Page, StoreError> {
        let path = self.path.clone().ok_or(StoreError::NotLoaded)?;
        if !self.is_partial_load {
            return Err(StoreError::Unsupported { operation: "section" });
        }

        let section_size = self.config.section_size;
        let base = index.saturating_mul(section_size);
        // One past the section, so a full section can tell whether more follow
        let wanted = base.saturating_add(section_size).saturating_add(1);
        if !self.scan_exhausted && self.known_records < wanted {
            let result = FileCursor::new(&path).count_records(Some(wanted));
            let counted = self.guard(result)?;
            self.known_records = counted;
            self.scan_exhausted = counted < wanted;
        }

        if base >= self.known_records {
            return Err(StoreError::NoSuchSection {
                index,
                available: self.section_count(),
            });
        }

        let end = (base + section_size).min(self.known_records);
        let result = match self.source.as_mut().and_then(|s| s.as_prefetch_mut()) {
            Some(cache) => cache.select_span(base, end),
            None => Err(StoreError::Unsupported { operation: "section" }),
        };
        self.guard(result)?;

        tracing::info!(section = index, base, end, "selected section");
        self.section = index;
        self.window = PageWindow::section(base, end, self.window.user_page_size);
        self.current = Page::default();
        self.get_page(PageRole::First)
    }

    /// Sections known so far; see [`Self::more_sections`]
    pub fn section_count(&self) -> usize {
        if !self.is_partial_load {
            return usize::from(self.is_loaded());
        }
        self.known_records.div_ceil(self.config.section_size)
    }

    /// Whether the file may hold sections past [`Self::section_count`]
    pub fn more_sections(&self) -> bool {
        !self.scan_exhausted
    }

    /// Zero-based index of the section being paged
    pub fn current_section(&self) -> usize {
        self.section
    }

    // =====================================================================
    // Sort / filter (in-memory mode only)
    // =====================================================================

    /// Sort by `column`; clicking the same column again flips direction
    ///
    /// A new sort replaces any earlier reversal.
    pub fn sort_by(&mut self, column: &str) -> Result<Page, StoreError> {
        self.prepare_resident("sort")?;

        let mut sort = self.sort.clone();
        sort.toggle(column);
        let filters = std::mem::take(&mut self.filters);
        self.rearrange(&filters, &sort, false);
        tracing::debug!(column, ascending = sort.ascending, "sorted records");

        self.filters = filters;
        self.sort = sort;
        self.reversed = false;
        self.get_page(PageRole::First)
    }

    /// Reverse the current record order; kept across later filters
    pub fn reverse_order(&mut self) -> Result<Page, StoreError> {
        self.prepare_resident("reverse")?;

        let (sort, reversed) = (self.sort.clone(), !self.reversed);
        let filters = std::mem::take(&mut self.filters);
        self.rearrange(&filters, &sort, reversed);

        self.filters = filters;
        self.reversed = reversed;
        self.get_page(PageRole::First)
    }

    /// Keep only records matching every criterion
    pub fn filter(&mut self, criteria: Vec<FilterCriterion>) -> Result<Page, StoreError> {
        self.prepare_resident("filter")?;

        let sort = self.sort.clone();
        let total = self.rearrange(&criteria, &sort, self.reversed);
        tracing::debug!(criteria = criteria.len(), total, "filtered records");

        self.filters = criteria;
        self.get_page(PageRole::First)
    }

    /// Remove all filters
    pub fn clear_filter(&mut self) -> Result<Page, StoreError> {
        self.prepare_resident("filter")?;

        let sort = self.sort.clone();
        self.rearrange(&[], &sort, self.reversed);

        self.filters.clear();
        self.get_page(PageRole::First)
    }

    /// Rebuild the resident view and reset the window to its length
    fn rearrange(
        &mut self,
        criteria: &[FilterCriterion],
        sort: &SortState,
        reversed: bool,
    ) -> usize {
        let total = match self.resident_mut() {
            Some(resident) => {
                resident.arrange(criteria, sort, reversed);
                resident.len()
            }
            None => 0,
        };
        self.window.reset_total(total);
        total
    }

    /// Settle background ingestion and reject large-file mode
    fn prepare_resident(&mut self, operation: &'static str) -> Result<(), StoreError> {
        let source = self.source_mut()?;
        if source.as_resident().is_none() {
            return Err(StoreError::Unsupported { operation });
        }
        let result = source.settle();
        self.guard(result)
    }

    fn resident_mut(&mut self) -> Option<&mut ResidentSource> {
        self.source.as_mut().and_then(|s| s.as_resident_mut())
    }

    // =====================================================================
    // Display metadata
    // =====================================================================

    pub fn page_navigation_string(&self) -> String {
        self.window.navigation_string()
    }

    pub fn current_start_index(&self) -> usize {
        self.window.start
    }

    /// Records being paged: the filtered view, or the selected section
    pub fn total_record_count(&self) -> usize {
        self.window.len()
    }

    /// Length of the current page
    pub fn page_size(&self) -> usize {
        self.window.page_size
    }

    /// Configured page length
    pub fn user_page_size(&self) -> usize {
        self.window.user_page_size
    }

    pub fn current_page(&self) -> &Page {
        &self.current
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_large_file(&self) -> bool {
        self.is_large_file
    }

    pub fn is_reading_file(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.is_reading())
    }

    /// Whether the total was capped to one section
    pub fn is_partial_load(&self) -> bool {
        self.is_partial_load
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Whether `reverse_order` is in effect on top of the sort
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn filters(&self) -> &[FilterCriterion] {
        &self.filters
    }

    /// Page sizes worth offering for the current record count
    pub fn page_size_options(&self) -> Vec<usize> {
        let total = self.window.len();
        if total == 0 {
            return vec![1];
        }
        PAGE_SIZE_OPTIONS
            .iter()
            .copied()
            .filter(|&size| size < total)
            .collect()
    }

    pub fn page_sizing_enabled(&self) -> bool {
        self.window.len() > PAGE_SIZING_MIN_RECORDS
    }

    /// Field names seen in the resident records, or on the current page in
    /// large-file mode
    pub fn column_names(&self) -> Vec<String> {
        match self.source.as_ref().and_then(|s| s.as_resident()) {
            Some(resident) => collect_columns(resident.records()),
            None => collect_columns(self.current.iter()),
        }
    }

    /// Prefetch counters; `None` unless a large file is loaded
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache_source().map(|cache| cache.stats())
    }

    fn cache_source(&self) -> Option<&PrefetchCache> {
        self.source.as_deref()?.as_prefetch()
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn source_mut(&mut self) -> Result<&mut Box<dyn PageSource>, StoreError> {
        self.source.as_mut().ok_or(StoreError::NotLoaded)
    }

    /// Unload after a failure that leaves the source unusable
    fn guard<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(e) = &result {
            if e.is_fatal() {
                tracing::warn!("unloading {:?} after error: {}", self.path, e);
                self.unload();
            }
        }
        result
    }
}

impl Default for PageStore {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl std::fmt::Debug for PageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStore")
            .field("path", &self.path)
            .field("window", &self.window)
            .field("is_large_file", &self.is_large_file)
            .field("section", &self.section)
            .field("sort", &self.sort)
            .field("reversed", &self.reversed)
            .field("filters", &self.filters)
            .finish()
    }
}
