use anyhow::Result;
use colored::Colorize;
use std::net::SocketAddr;
use whathappened_core::Config;
use whathappened_server::WhathappenedServer;

pub async fn run(host: String, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    println!("{}", "Starting whathappened server...".bold().cyan());
    println!("   {}: {}", "OSM API".bold(), config.api.base_url);

    let server = WhathappenedServer::new(config)?;

    println!(
        "   {}: {}",
        "API Server".bold(),
        format!("http://{}/whathappened/<changeset>/<tag|tag>", addr).green()
    );
    println!();
    println!("{}", "Press Ctrl+C to stop".dimmed());
    println!();

    server.serve(addr).await?;

    Ok(())
}
