use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;

use logview::cli::{CliArgs, StartupMode};
use logview::commands::{Command, Outcome};
use logview::{PageRole, PageStore, ViewerConfig};

fn main() -> Result<()> {
    logview::tracing::init();

    let args = CliArgs::parse();
    let startup = args
        .into_config(ViewerConfig::load())
        .map_err(anyhow::Error::msg)?;

    let mut store = PageStore::new(startup.viewer);
    let mut stdout = io::stdout().lock();

    if let Some(path) = &startup.path {
        store
            .load(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let page = store.get_page(PageRole::First)?;
        write!(
            stdout,
            "{}",
            logview::render::render_page(&page, &store.page_navigation_string())
        )?;
    }

    match startup.mode {
        StartupMode::Script(lines) => {
            for line in lines {
                if !run_line(&line, &mut store, &mut stdout)? {
                    break;
                }
            }
        }
        StartupMode::Interactive => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut line = String::new();
            loop {
                write!(stdout, "> ")?;
                stdout.flush()?;

                line.clear();
                if input.read_line(&mut line)? == 0 {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }
                if !run_line(&line, &mut store, &mut stdout)? {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Parse and run one command line; returns `false` on quit
///
/// Bad input and store errors are reported and the session continues.
fn run_line(line: &str, store: &mut PageStore, out: &mut impl Write) -> Result<bool> {
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            writeln!(out, "{}", e)?;
            return Ok(true);
        }
    };

    tracing::debug!(?command, "running command");
    match command.execute(store) {
        Ok(Outcome::Output(text)) => write!(out, "{}", text)?,
        Ok(Outcome::Quit) => return Ok(false),
        Err(e) => {
            tracing::warn!("{:?} failed: {}", command, e);
            writeln!(out, "error: {}", e)?;
        }
    }
    Ok(true)
}
