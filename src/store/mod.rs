//! Paginated record store for JSON-lines log files
//!
//! Serves fixed-size pages of a log file where each non-blank line is one
//! JSON object. Small files are held in memory and can be sorted and
//! filtered; files above the large-file threshold are streamed from disk
//! through a prefetching page cache.
//!
//! # Architecture
//!
//! ```text
//! PageStore
//! ├── PageWindow (start / page size / total arithmetic)
//! └── Box<dyn PageSource>
//!     ├── ResidentSource (all records, background ingestion)
//!     └── PrefetchCache (first/last + neighbour slots)
//!             └── Arc<Mutex<FileCursor>> (forward-only line reader)
//! ```

mod cache;
mod cursor;
mod error;
mod navigation;
mod page;
mod page_store;
mod query;
mod record;
mod source;

pub use cache::{CacheStats, PrefetchCache, Slot};
pub use cursor::FileCursor;
pub use error::StoreError;
pub use navigation::PageWindow;
pub use page::{Page, PageRole};
pub use page_store::{PageStore, PAGE_SIZE_OPTIONS};
pub use query::{filter_records, sort_records, FilterCriterion, SortState};
pub use record::{collect_columns, parse_record, ParseError, Record};
pub use source::{PageSource, ResidentSource};
