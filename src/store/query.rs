//! Sorting and filtering over resident records
//!
//! Records do not share a schema. Sorting keeps records that lack the sort
//! column (in their original order) after the sorted ones, and filtering
//! treats a missing column as a non-match.

use super::record::Record;

/// Current sort column and direction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: Option<String>,
    pub ascending: bool,
}

impl SortState {
    /// Apply a click on `column`: the same column twice toggles direction,
    /// a new column starts ascending.
    pub fn toggle(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column.to_string());
            self.ascending = true;
        }
    }

    pub fn is_active(&self) -> bool {
        self.column.is_some()
    }
}

/// One `column contains substring` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriterion {
    pub column: String,
    pub substring: String,
}

impl FilterCriterion {
    pub fn new(column: impl Into<String>, substring: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            substring: substring.into(),
        }
    }

    /// Case-sensitive containment on the field's text
    pub fn matches(&self, record: &Record) -> bool {
        record
            .field_text(&self.column)
            .is_some_and(|text| text.contains(&self.substring))
    }
}

impl std::str::FromStr for FilterCriterion {
    type Err = String;

    /// Parse `column=substring`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, substring) = s
            .split_once('=')
            .ok_or_else(|| format!("expected COLUMN=TEXT, got '{}'", s))?;
        if column.is_empty() {
            return Err(format!("missing column in '{}'", s));
        }
        Ok(FilterCriterion::new(column, substring))
    }
}

/// Stable sort by `column`; records without the column go last, unsorted
pub fn sort_records(records: Vec<Record>, column: &str, ascending: bool) -> Vec<Record> {
    let (with, without): (Vec<Record>, Vec<Record>) =
        records.into_iter().partition(|r| r.has(column));

    let mut keyed: Vec<(String, Record)> = with
        .into_iter()
        .map(|r| (r.field_text(column).unwrap_or_default(), r))
        .collect();

    if ascending {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
    } else {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    }

    keyed
        .into_iter()
        .map(|(_, r)| r)
        .chain(without)
        .collect()
}

/// Keep records matching every criterion, in order
pub fn filter_records(records: &[Record], criteria: &[FilterCriterion]) -> Vec<Record> {
    records
        .iter()
        .filter(|r| criteria.iter().all(|c| c.matches(r)))
        .cloned()
        .collect()
}
