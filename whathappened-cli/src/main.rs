use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

mod commands;

use commands::{check, diff, serve};

#[derive(Parser)]
#[command(name = "whathappened")]
#[command(version, about = "What happened to the tags you watch in an OSM changeset", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Port for the API server
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Show watched tag changes made by a changeset
    Check {
        /// Changeset ID
        changeset: u64,

        /// Tag keys to watch
        #[arg(required = true)]
        watch: Vec<String>,

        /// OSM type names to report, comma separated (defaults to node,way)
        #[arg(short, long, value_delimiter = ',')]
        types: Option<Vec<String>>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how an object's tags differ from its previous version
    Diff {
        /// OSM type (node, way or relation)
        osmtype: String,

        /// Object ID
        id: u64,

        /// Version to inspect (defaults to the latest)
        #[arg(short, long)]
        version: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config)?;
    debug!(
        api = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        max_concurrent_fetches = config.evaluation.max_concurrent_fetches,
        "configuration loaded"
    );

    match cli.command {
        Commands::Serve { port, host } => {
            serve::run(host, port, config).await?;
        }
        Commands::Check {
            changeset,
            watch,
            types,
            json,
        } => {
            check::run(changeset, watch, types, json, config).await?;
        }
        Commands::Diff {
            osmtype,
            id,
            version,
        } => {
            diff::run(osmtype, id, version, config).await?;
        }
    }

    Ok(())
}
