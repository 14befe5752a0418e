use anyhow::Result;
use colored::Colorize;
use whathappened_core::{compare, fetch_history, Config, HttpSource, OsmType};

pub async fn run(osmtype: String, id: u64, version: Option<u32>, config: Config) -> Result<()> {
    let osmtype: OsmType = osmtype.parse()?;
    let source = HttpSource::new(&config.api)?;

    let spinner = super::spinner(format!("Fetching history of {} {}", osmtype, id));
    let history = fetch_history(&source, osmtype, id).await;
    spinner.finish_and_clear();
    let history = history?;

    let current = match version {
        Some(version) => history.get(version).cloned().ok_or_else(|| {
            anyhow::anyhow!("{} {} v{} is not available (redacted or unknown)", osmtype, id, version)
        })?,
        None => history
            .latest_version()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{} {} has no visible history", osmtype, id))?,
    };

    if current.version == 1 {
        println!("{}", format!("{} is the first version", current).yellow());
        return Ok(());
    }

    let mut current = current.with_history(history);
    let previous = current.previous_version(&source).await?.clone();
    let diff = compare(&current, &previous)?;

    println!(
        "{} {}",
        current.to_string().bold().cyan(),
        format!("compared with v{}", previous.version).dimmed()
    );
    if let Some(user) = &current.user {
        println!("{}: {}", "User".bold(), user);
    }
    if let Some(timestamp) = current.timestamp {
        println!("{}: {}", "Date".bold(), timestamp.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(changeset) = current.changeset {
        println!("{}: {}", "Changeset".bold(), changeset);
    }
    println!();

    if diff.is_empty() {
        println!("{}", "No tag changes".green());
        return Ok(());
    }

    for line in diff.lines() {
        println!("  {}", super::colored_line(&line));
    }
    if !diff.same.is_empty() {
        println!();
        println!(
            "  {} tag(s) unchanged",
            diff.same.len().to_string().dimmed()
        );
    }

    Ok(())
}
