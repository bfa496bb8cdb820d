mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use token_resolver::sources::ReqwestJson;
use token_resolver::{AppConfig, CatalogIngestor, TokenResolver};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, CliHandler, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    // CLI flags > config file > env vars > defaults
    let config = AppConfig::load_with_cli(&cli.config).context("loading configuration")?;
    let http = Arc::new(ReqwestJson::new(config.http_timeout()));
    let resolver = Arc::new(TokenResolver::from_config(&config, http.clone()).await?);
    let out = CliHandler { json: cli.json };

    match cli.command {
        Command::Find { address } => {
            let token = resolver
                .find(Some(&address))
                .await?
                .context("no token for address")?;
            out.print_token(&token);
        }
        Command::Refresh { address } => {
            let token = resolver.refresh(&address).await?;
            out.print_token(&token);
        }
        Command::List => {
            let tokens = resolver.store().list().await?;
            out.print_tokens(&tokens);
        }
        Command::Ingest => {
            if config.tokenlists.is_empty() {
                anyhow::bail!("no token lists configured (--tokenlist or TOKENLISTS)");
            }
            let chain_id = resolver.chain_id(config.chain_id).await?;
            let ingestor = CatalogIngestor::new(
                resolver.clone(),
                http,
                chain_id,
                config.ignored_token_addresses.clone(),
            );
            let report = ingestor.ingest(&config.tokenlists).await;
            out.print_report(&report);
        }
        Command::Aggregator { address } => {
            let token = resolver
                .find(Some(&address))
                .await?
                .context("no token for address")?;
            let point = resolver.engine().aggregator_price(&token).await;
            out.print_quote(&token, &point);
        }
    }

    Ok(())
}
