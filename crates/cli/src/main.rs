//! Operator commands for wishlist-edge.
//!
//! Configuration is read the same way the server reads it
//! (`WISHLIST_EDGE_*` variables over an optional TOML file).

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use http::Method;
use tracing_subscriber::EnvFilter;
use wishlist_edge_client::{FetchConfig, HttpNetwork};
use wishlist_edge_core::{
    AppConfig, CacheController, CacheStorage, ControllerConfig, Ingestor, SharePayload, open_storage,
};

#[derive(Parser, Debug)]
#[command(name = "wishlist-edge-cli")]
#[command(about = "Operate the wishlist-edge offline cache")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install and activate the configured generation against the upstream.
    Prime,

    /// List cache generations with their entry counts.
    Generations,

    /// Print the redirect a share submission would produce.
    Ingest {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load()?;
    let storage = open_storage(&config).await?;

    let output = match args.command {
        Command::Prime => {
            let network = Arc::new(HttpNetwork::new(&FetchConfig::from_app(&config))?);
            let controller = CacheController::new(ControllerConfig::from_app(&config)?, storage.clone(), network);
            controller.install().await?;
            controller.settle_writes().await;
            generations(storage.as_ref(), &config.cache_version).await?
        }
        Command::Generations => generations(storage.as_ref(), &config.cache_version).await?,
        Command::Ingest { title, text, url } => ingest(&config, SharePayload { title, text, url }),
    };

    println!("{output}");
    Ok(())
}

/// One line per generation: a `*` marks `current`, then name and entry count.
async fn generations(storage: &dyn CacheStorage, current: &str) -> Result<String> {
    let mut lines = Vec::new();
    for name in storage.generations().await? {
        let marker = if name == current { '*' } else { ' ' };
        let count = storage.entry_count(&name).await?;
        lines.push(format!("{marker} {name}\t{count}"));
    }

    if lines.is_empty() {
        return Ok("no cache generations".to_string());
    }
    Ok(lines.join("\n"))
}

fn ingest(config: &AppConfig, payload: SharePayload) -> String {
    let target = Ingestor::new(config.share_destination.as_str()).ingest(Ok(payload), &Method::POST);
    format!("{} {}", target.status.as_u16(), target.location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use wishlist_edge_core::{CachedResponse, MemoryStorage, Request, RequestKey, Response};

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_ingest() {
        let args = Args::parse_from(["wishlist-edge-cli", "ingest", "--title", "Gift", "--url", "https://x.test/c"]);
        let Command::Ingest { title, text, url } = args.command else {
            panic!("expected ingest");
        };
        assert_eq!(title.as_deref(), Some("Gift"));
        assert_eq!(text, None);
        assert_eq!(url.as_deref(), Some("https://x.test/c"));
    }

    #[test]
    fn test_ingest_output() {
        let payload = SharePayload { text: Some("check this https://x.test/b out".to_string()), ..Default::default() };
        assert_eq!(ingest(&AppConfig::default(), payload), "303 /add-product?url=https://x.test/b&shared=true");
    }

    #[tokio::test]
    async fn test_generations_output() {
        let storage = MemoryStorage::default();
        assert_eq!(generations(&storage, "mywishlist-v2").await.unwrap(), "no cache generations");

        let request = Request::get("http://127.0.0.1:3000/feed".parse().unwrap());
        let key = RequestKey::for_request(&request).unwrap();
        let entry = CachedResponse::capture(&request, &Response::new(http::StatusCode::OK, "feed"));
        storage.put("mywishlist-v2", &key, &entry).await.unwrap();
        storage.open("mywishlist-v1").await.unwrap();

        let output = generations(&storage, "mywishlist-v2").await.unwrap();
        assert_eq!(output, "  mywishlist-v1\t0\n* mywishlist-v2\t1");
    }
}
