//! Command-line surface of the metasync live-preview driver.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use metasync_cms::{CmsPort, ContentstackConfig, DEFAULT_PREVIEW_URL};
use metasync_engine::{LivePreview, MetafieldOptions, Position, TransformOptions};
use metasync_model::{CslpMapping, MetaobjectEntries};
use serde_json::{json, Value};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "metasync-preview")]
#[command(about = "Render Contentstack live-preview entries as Shopify metaobjects")]
pub struct Cli {
    #[command(flatten)]
    pub connection: Connection,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Delivery API credentials.
#[derive(Args, Debug, Clone)]
pub struct Connection {
    #[arg(long, env = "CONTENTSTACK_DELIVERY_TOKEN", default_value = "", hide_env_values = true)]
    pub delivery_token: String,

    #[arg(long, env = "CONTENTSTACK_PREVIEW_TOKEN", default_value = "", hide_env_values = true)]
    pub preview_token: String,

    #[arg(long, env = "CONTENTSTACK_ENVIRONMENT", default_value = "")]
    pub environment: String,

    #[arg(long, env = "CONTENTSTACK_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "CONTENTSTACK_PREVIEW_URL", default_value = DEFAULT_PREVIEW_URL)]
    pub preview_url: String,
}

impl From<Connection> for ContentstackConfig {
    fn from(connection: Connection) -> Self {
        ContentstackConfig {
            delivery_token: connection.delivery_token,
            preview_token: connection.preview_token,
            environment: connection.environment,
            api_key: connection.api_key,
            preview_url: connection.preview_url,
        }
    }
}

/// The entry being previewed.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    #[arg(long)]
    pub content_type: String,

    #[arg(long)]
    pub entry: String,

    /// Live-preview session hash
    #[arg(long)]
    pub hash: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the entry together with its content type schema
    Fetch(Target),

    /// Print the metaobjects and edit-tag mapping produced from the entry
    Metaobjects(Target),

    /// Merge the entry into a stored metafield snapshot
    Metafields {
        #[command(flatten)]
        target: Target,

        /// JSON file holding the current metafields
        #[arg(long)]
        current: std::path::PathBuf,
    },
}

/// Transforms the target entry into a fresh accumulator.
///
/// Output: `{"metaobjects": ..., "dataCSLPMapping": ...}`.
pub async fn render_metaobjects<P: CmsPort>(
    preview: &LivePreview<P>,
    target: &Target,
) -> Result<Value> {
    let content_type = preview
        .port()
        .get_content_type(&target.content_type, &target.hash)
        .await
        .with_context(|| format!("Failed to fetch content type {}", target.content_type))?;
    let entry = preview
        .port()
        .get_entry(&target.content_type, &target.entry, &target.hash)
        .await
        .with_context(|| format!("Failed to fetch entry {}", target.entry))?;

    let mut metaobjects = MetaobjectEntries::new();
    let mut cslp = CslpMapping::new();
    preview
        .create_metaobject_entries(
            content_type.view(),
            std::slice::from_ref(&entry),
            Position::root(),
            &mut metaobjects,
            &mut cslp,
            &TransformOptions::new(target.hash.as_str()),
        )
        .await?;

    info!("Rendered {} metaobject types", metaobjects.len());
    Ok(json!({
        "metaobjects": metaobjects,
        "dataCSLPMapping": cslp,
    }))
}

/// Merges the target entry into `current`. `Null` when the snapshot is not
/// an object.
pub async fn merge_metafields<P: CmsPort>(
    preview: &LivePreview<P>,
    target: &Target,
    current: &Value,
) -> Result<Value> {
    let content_type = preview
        .port()
        .get_content_type(&target.content_type, &target.hash)
        .await
        .with_context(|| format!("Failed to fetch content type {}", target.content_type))?;
    let entry = preview
        .port()
        .get_entry(&target.content_type, &target.entry, &target.hash)
        .await
        .with_context(|| format!("Failed to fetch entry {}", target.entry))?;

    let key_based = preview.create_content_type_key_based(&content_type.schema);
    let options = MetafieldOptions::new(
        target.content_type.as_str(),
        target.entry.as_str(),
        target.hash.as_str(),
    );
    let merged = preview
        .get_updated_product_metafields(current, &key_based, &entry, &options)
        .await?;
    Ok(serde_json::to_value(merged)?)
}

/// Reads a metafield snapshot from disk.
pub async fn read_snapshot(path: &std::path::Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
