//! Pages and page roles

use super::record::Record;

/// A logical page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRole {
    First,
    Previous,
    Next,
    Last,
}

impl PageRole {
    pub const ALL: [PageRole; 4] = [
        PageRole::First,
        PageRole::Previous,
        PageRole::Next,
        PageRole::Last,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageRole::First => "first",
            PageRole::Previous => "previous",
            PageRole::Next => "next",
            PageRole::Last => "last",
        }
    }
}

impl std::fmt::Display for PageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(PageRole::First),
            "previous" | "prev" => Ok(PageRole::Previous),
            "next" => Ok(PageRole::Next),
            "last" => Ok(PageRole::Last),
            other => Err(format!("unknown page: {}", other)),
        }
    }
}

/// A contiguous run of records covering `[start, start + len)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub start: usize,
    pub records: Vec<Record>,
}

impl Page {
    pub fn new(start: usize, records: Vec<Record>) -> Self {
        Self { start, records }
    }

    /// Placeholder for a slot that holds nothing yet
    pub fn empty(start: usize) -> Self {
        Self {
            start,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One past the last logical index
    pub fn end(&self) -> usize {
        self.start + self.records.len()
    }

    /// 1-based row number of the record at `index` within this page
    pub fn row_number(&self, index: usize) -> usize {
        self.start + index + 1
    }

    /// Whether this page holds exactly `[start, start + len)`
    pub fn covers(&self, start: usize, len: usize) -> bool {
        self.start == start && self.records.len() == len
    }

    /// Split into `[start, start + at)` and the remainder
    pub fn split_at(mut self, at: usize) -> (Page, Page) {
        let at = at.min(self.records.len());
        let tail = self.records.split_off(at);
        let tail_start = self.start + at;
        (self, Page::new(tail_start, tail))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}
