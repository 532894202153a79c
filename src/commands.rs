//! Viewer commands
//!
//! Commands are the text the user types at the prompt (or passes with
//! `--command`). Each one maps onto a single `PageStore` operation and
//! produces the text to print.

use std::path::PathBuf;
use std::str::FromStr;

use crate::render;
use crate::store::{FilterCriterion, PageRole, PageStore, StoreError};

// ============================================================================
// Command Registry
// ============================================================================

/// Help entry for one command
pub struct CommandDef {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

/// Static registry of all available commands
pub static COMMANDS: &[CommandDef] = &[
    CommandDef {
        name: "first",
        usage: "first",
        description: "Go to the first page",
    },
    CommandDef {
        name: "prev",
        usage: "prev",
        description: "Go to the previous page",
    },
    CommandDef {
        name: "next",
        usage: "next",
        description: "Go to the next page",
    },
    CommandDef {
        name: "last",
        usage: "last",
        description: "Go to the last page",
    },
    CommandDef {
        name: "section",
        usage: "section N",
        description: "Page through section N of a partially loaded file",
    },
    CommandDef {
        name: "size",
        usage: "size N",
        description: "Show N records per page",
    },
    CommandDef {
        name: "sort",
        usage: "sort COLUMN",
        description: "Sort by COLUMN; repeat to flip direction",
    },
    CommandDef {
        name: "reverse",
        usage: "reverse",
        description: "Reverse the current order",
    },
    CommandDef {
        name: "filter",
        usage: "filter COLUMN=TEXT[; COLUMN=TEXT...]",
        description: "Keep records whose COLUMN contains TEXT (spaces allowed)",
    },
    CommandDef {
        name: "clear",
        usage: "clear",
        description: "Remove all filters",
    },
    CommandDef {
        name: "columns",
        usage: "columns",
        description: "List field names",
    },
    CommandDef {
        name: "info",
        usage: "info",
        description: "Show file and paging status",
    },
    CommandDef {
        name: "open",
        usage: "open PATH",
        description: "Load another log file",
    },
    CommandDef {
        name: "help",
        usage: "help",
        description: "Show this list",
    },
    CommandDef {
        name: "quit",
        usage: "quit",
        description: "Exit",
    },
];

/// Usage text built from the registry
pub fn help_text() -> String {
    let width = COMMANDS.iter().map(|c| c.usage.len()).max().unwrap_or(0);
    COMMANDS
        .iter()
        .map(|c| format!("  {:<width$}  {}\n", c.usage, c.description, width = width))
        .collect()
}

// ============================================================================
// Parsing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Page(PageRole),
    /// One-based section number
    Section(usize),
    PageSize(usize),
    Sort(String),
    Reverse,
    Filter(Vec<FilterCriterion>),
    ClearFilter,
    Columns,
    Info,
    Open(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (name, rest) = match input.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (input, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "first" | "prev" | "previous" | "next" | "last" => Command::Page(name.parse()?),
            "section" => {
                let number = rest
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| format!("usage: section N (got '{}')", rest))?;
                Command::Section(number)
            }
            "size" => {
                let size = rest
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| format!("usage: size N (got '{}')", rest))?;
                Command::PageSize(size)
            }
            "sort" if !rest.is_empty() => Command::Sort(rest.to_string()),
            "sort" => return Err("usage: sort COLUMN".to_string()),
            "reverse" => Command::Reverse,
            "filter" if !rest.is_empty() => Command::Filter(parse_criteria(rest)?),
            "filter" => return Err("usage: filter COLUMN=TEXT[; COLUMN=TEXT...]".to_string()),
            "clear" => Command::ClearFilter,
            "columns" => Command::Columns,
            "info" => Command::Info,
            "open" if !rest.is_empty() => Command::Open(PathBuf::from(rest)),
            "open" => return Err("usage: open PATH".to_string()),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "" => return Err("empty command".to_string()),
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };

        Ok(command)
    }
}

/// Split `level=warn; msg=connection refused` into criteria
///
/// Criteria are separated by `;` so values may contain spaces. Whitespace
/// around each criterion and around `=` is dropped.
fn parse_criteria(input: &str) -> Result<Vec<FilterCriterion>, String> {
    let criteria = input
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let criterion = FilterCriterion::from_str(part)?;
            Ok(FilterCriterion::new(
                criterion.column.trim_end(),
                criterion.substring.trim_start(),
            ))
        })
        .collect::<Result<Vec<_>, String>>()?;

    if criteria.is_empty() {
        return Err("usage: filter COLUMN=TEXT[; COLUMN=TEXT...]".to_string());
    }
    Ok(criteria)
}

// ============================================================================
// Execution
// ============================================================================

/// What the caller should do after a command ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print this and keep going
    Output(String),
    Quit,
}

impl Command {
    /// Run against `store`, returning the text to show
    pub fn execute(&self, store: &mut PageStore) -> Result<Outcome, StoreError> {
        let output = match self {
            Command::Page(role) => {
                let page = store.get_page(*role)?;
                render::render_page(&page, &store.page_navigation_string())
            }
            Command::Section(number) => {
                let page = store.select_section(number - 1)?;
                render::render_page(&page, &store.page_navigation_string())
            }
            Command::PageSize(size) => {
                store.set_page_size(*size)?;
                render::render_current(store)
            }
            Command::Sort(column) => {
                store.sort_by(column)?;
                render::render_current(store)
            }
            Command::Reverse => {
                store.reverse_order()?;
                render::render_current(store)
            }
            Command::Filter(criteria) => {
                store.filter(criteria.clone())?;
                render::render_current(store)
            }
            Command::ClearFilter => {
                store.clear_filter()?;
                render::render_current(store)
            }
            Command::Columns => render::render_columns(&store.column_names()),
            Command::Info => render::render_info(store),
            Command::Open(path) => {
                store.load(path)?;
                store.get_page(PageRole::First)?;
                render::render_current(store)
            }
            Command::Help => help_text(),
            Command::Quit => return Ok(Outcome::Quit),
        };

        Ok(Outcome::Output(output))
    }
}
