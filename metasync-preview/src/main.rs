//! metasync live-preview driver
//!
//! Fetches a Contentstack live-preview entry and prints what the storefront
//! would receive:
//!   metasync-preview metaobjects --content-type product --entry blt1 --hash <h>
//!
//! Credentials come from flags or the CONTENTSTACK_* environment variables.

use anyhow::{Context, Result};
use clap::Parser;
use metasync_engine::LivePreview;
use metasync_preview::{merge_metafields, read_snapshot, render_metaobjects, Cli, Command};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let preview = LivePreview::connect(cli.connection.into())
        .context("Invalid Contentstack configuration")?;
    debug!("Connected to {}", preview.port().config().base_url());

    let output = match &cli.command {
        Command::Fetch(target) => {
            info!("Fetching {}/{}", target.content_type, target.entry);
            preview
                .fetch_data(&target.content_type, &target.entry, &target.hash)
                .await?
        }
        Command::Metaobjects(target) => render_metaobjects(&preview, target).await?,
        Command::Metafields { target, current } => {
            let current = read_snapshot(current).await?;
            merge_metafields(&preview, target, &current).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
