use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use jsondir_core::parse_search_params;
use jsondir_storage::{CollectionOptions, Collections, PersistentStorage};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsondir")]
#[command(about = "jsondir admin CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the collections found under BASE/api.
    Discover { base: PathBuf },
    /// Load every collection and report item counts or load errors.
    Check { base: PathBuf },
    /// Run a query string against one collection.
    Query {
        base: PathBuf,
        url_path: String,
        #[arg(long, default_value = "")]
        params: String,
    },
}

fn collections(base: PathBuf) -> Result<Collections> {
    if !base.is_dir() {
        bail!("base directory {} does not exist", base.display());
    }
    let options = CollectionOptions::new(base, Arc::new(PersistentStorage::new()));
    Ok(Collections::new(options))
}

async fn check(collections: &Collections) -> Result<bool> {
    let mut healthy = true;
    let mut report = Vec::new();
    for entry in collections.discover() {
        debug!(url_path = %entry.url_path, path = %entry.path.display(), "checking collection");
        match collections.load(&entry.url_path).await {
            Ok(c) => report.push(json!({
                "urlPath": entry.url_path,
                "items": c.len(),
                "lastId": c.last_id(),
            })),
            Err(e) => {
                healthy = false;
                report.push(json!({
                    "urlPath": entry.url_path,
                    "error": e.code(),
                    "message": e.to_string(),
                }));
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(healthy)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Discover { base } => {
            let found = collections(base)?.discover();
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Cmd::Check { base } => {
            if !check(&collections(base)?).await? {
                std::process::exit(1);
            }
        }
        Cmd::Query {
            base,
            url_path,
            params,
        } => {
            let query = parse_search_params(url::form_urlencoded::parse(params.as_bytes()))?;
            let collection = collections(base)?.load(&url_path).await?;
            println!("{}", serde_json::to_string_pretty(&collection.query(&query))?);
        }
    }
    Ok(())
}
