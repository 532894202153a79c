//! Plain-text rendering of pages and store status

use std::fmt::Write;

use crate::store::{Page, PageStore};
use crate::util::filename_for_display;

/// Render `page` as numbered JSON lines followed by the navigation string
///
/// Row numbers are 1-based positions in the logical record sequence, so they
/// follow the current sort and filter rather than the file's line numbers.
pub fn render_page(page: &Page, navigation: &str) -> String {
    let mut out = String::new();
    let width = page.row_number(page.len().saturating_sub(1)).to_string().len();

    for (i, record) in page.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>width$}  {}",
            page.row_number(i),
            record.to_json_line(),
            width = width
        );
    }

    let _ = writeln!(out, "-- {} --", navigation);
    out
}

/// Render the store's current page with a navigation footer
pub fn render_current(store: &PageStore) -> String {
    render_page(store.current_page(), &store.page_navigation_string())
}

/// One line per column name
pub fn render_columns(columns: &[String]) -> String {
    if columns.is_empty() {
        return "(no columns)\n".to_string();
    }
    let mut out = columns.join("\n");
    out.push('\n');
    out
}

/// Summary of what is loaded and how it is being paged
pub fn render_info(store: &PageStore) -> String {
    let Some(path) = store.path() else {
        return "No file loaded\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "file:       {}", filename_for_display(path));
    let _ = writeln!(out, "records:    {}", store.total_record_count());

    let mode = match (store.is_large_file(), store.is_partial_load()) {
        (true, true) => "large file (one section at a time)",
        (true, false) => "large file (streamed)",
        (false, _) => "in memory",
    };
    let _ = writeln!(out, "mode:       {}", mode);
    if store.is_partial_load() {
        let more = if store.more_sections() { "+" } else { "" };
        let _ = writeln!(
            out,
            "section:    {} of {}{}",
            store.current_section() + 1,
            store.section_count(),
            more
        );
    }
    if store.is_reading_file() {
        let _ = writeln!(out, "loading:    still reading");
    }

    let _ = writeln!(out, "page size:  {}", store.user_page_size());
    if store.page_sizing_enabled() {
        let options: Vec<String> = store
            .page_size_options()
            .iter()
            .map(|size| size.to_string())
            .collect();
        let _ = writeln!(out, "sizes:      {}", options.join(", "));
    }
    let _ = writeln!(out, "showing:    {}", store.page_navigation_string());

    let sort = store.sort_state();
    if sort.is_active() {
        let direction = if sort.ascending { "ascending" } else { "descending" };
        let column = sort.column.as_deref().unwrap_or_default();
        let _ = writeln!(out, "sorted by:  {} ({})", column, direction);
    }
    if store.is_reversed() {
        let _ = writeln!(out, "order:      reversed");
    }
    for criterion in store.filters() {
        let _ = writeln!(
            out,
            "filter:     {} contains \"{}\"",
            criterion.column, criterion.substring
        );
    }
    if let Some(stats) = store.cache_stats() {
        let _ = writeln!(
            out,
            "cache:      {} hits, {} misses, {} prefetch reads",
            stats.hits, stats.misses, stats.refresh_reads
        );
    }
    out
}
