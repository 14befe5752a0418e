pub mod check;
pub mod diff;
pub mod serve;

use anyhow::Result;
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use whathappened_core::diff::{DiffLine, DiffLineType};
use whathappened_core::Config;

pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(&path)
            .map_err(|e| anyhow::anyhow!("cannot load {}: {}", path.display(), e))?,
        None => Config::default(),
    };
    Ok(config.with_env_overrides()?)
}

pub fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn colored_line(line: &DiffLine) -> ColoredString {
    match line.line_type {
        DiffLineType::Created => format!("+ {}", line.content).green(),
        DiffLineType::Modified => format!("~ {}", line.content).yellow(),
        DiffLineType::Deleted => format!("- {}", line.content).red(),
    }
}
