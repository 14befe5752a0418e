use anyhow::Result;
use colored::Colorize;
use tracing::warn;
use whathappened_core::{Config, HttpSource, OsmType, WatchEvaluator};

pub async fn run(
    changeset: u64,
    watch: Vec<String>,
    types: Option<Vec<String>>,
    json: bool,
    config: Config,
) -> Result<()> {
    let osmtypes = types.unwrap_or_else(|| config.evaluation.default_osmtypes.clone());
    for name in osmtypes.iter().filter(|name| OsmType::parse(name).is_none()) {
        warn!(osmtype = %name, "not an OSM type, nothing will be reported for it");
    }

    let source = HttpSource::new(&config.api)?;
    let evaluator = WatchEvaluator::new(source)
        .with_max_concurrent_fetches(config.evaluation.max_concurrent_fetches);

    let spinner = super::spinner(format!("Evaluating changeset {}", changeset));
    let result = evaluator.evaluate(changeset, &watch, &osmtypes).await;
    spinner.finish_and_clear();
    let report = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {}",
        format!("Changeset {}", changeset).bold().cyan(),
        format!("(watching {})", watch.join(", ")).dimmed()
    );
    println!();

    for (osmtype, changes) in report.iter() {
        println!("{}", osmtype.bold());

        if changes.is_empty() {
            println!("  {}", "No watched changes".green());
            println!();
            continue;
        }

        for change in changes {
            println!(
                "  {} {}",
                format!("{} {}", osmtype, change.id).white().bold(),
                format!("v{}", change.version).dimmed()
            );
            for line in change.to_diff().lines() {
                println!("    {}", super::colored_line(&line));
            }
        }
        println!();
    }

    println!(
        "{} object(s) with watched changes",
        report.total().to_string().cyan()
    );

    Ok(())
}
