use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use token_resolver::api::ApiServer;
use token_resolver::config::CliConfig;
use token_resolver::sources::ReqwestJson;
use token_resolver::{AppConfig, CatalogIngestor, TokenResolver};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Token identity and price HTTP service", long_about = None)]
struct ApiArgs {
    #[command(flatten)]
    config: CliConfig,
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: String,
    /// Ingest the configured token lists in the background at start-up
    #[arg(long)]
    ingest: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ApiArgs::parse();
    let config = AppConfig::load_with_cli(&args.config)?;
    let http = Arc::new(ReqwestJson::new(config.http_timeout()));
    let resolver = Arc::new(TokenResolver::from_config(&config, http.clone()).await?);

    if args.ingest && !config.tokenlists.is_empty() {
        let resolver = resolver.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let chain_id = match resolver.chain_id(config.chain_id).await {
                Ok(id) => id,
                Err(e) => {
                    error!("cannot ingest token lists, chain id unavailable: {}", e);
                    return;
                }
            };
            let ignored = config.ignored_token_addresses.clone();
            let ingestor = CatalogIngestor::new(resolver, http, chain_id, ignored);
            let report = ingestor.ingest(&config.tokenlists).await;
            info!("start-up ingestion done: {:?}", report);
        });
    }

    let server = ApiServer::new(resolver);
    let listen = args.listen.clone();
    let handle = tokio::spawn(async move { server.start(&listen).await });

    // Keep runtime alive until ctrl+c
    tokio::select! {
        res = handle => res??,
        _ = signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}
