//! CLI subcommand definitions and output formatting.

use clap::{Parser, Subcommand};
use rust_decimal::prelude::*;
use token_resolver::config::CliConfig;
use token_resolver::{IngestReport, PricePoint, Token};

/// Resolve ERC20 token identity and reference-asset prices.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: CliConfig,
    /// Print JSON instead of a table row
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Look a token up, resolving it from chain if unknown
    Find { address: String },
    /// Re-resolve the price of a token
    Refresh { address: String },
    /// List stored tokens
    List,
    /// Ingest the configured token lists
    Ingest,
    /// One-hop aggregator quote into the reference asset
    Aggregator { address: String },
}

/// Handles CLI output.
pub struct CliHandler {
    pub json: bool,
}

impl CliHandler {
    pub fn print_token(&self, token: &Token) {
        if self.json {
            println!("{}", serde_json::to_string_pretty(token).unwrap_or_default());
            return;
        }
        let source = token.price_source.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<44} {:<10} {:>3}  {:>18} {:<10}{}",
            token.address,
            token.symbol,
            token.decimals,
            format_price(token.price),
            source,
            if token.stable { " stable" } else { "" }
        );
    }

    pub fn print_tokens(&self, tokens: &[Token]) {
        if self.json {
            println!("{}", serde_json::to_string_pretty(tokens).unwrap_or_default());
            return;
        }
        for token in tokens {
            self.print_token(token);
        }
        println!("{} tokens", tokens.len());
    }

    pub fn print_quote(&self, token: &Token, point: &PricePoint) {
        if self.json {
            println!(
                "{}",
                serde_json::json!({
                    "address": token.address,
                    "price": point.price,
                    "source": point.source,
                })
            );
            return;
        }
        println!(
            "{} {} = {} ({})",
            token.symbol,
            token.address,
            format_price(point.price),
            point.source
        );
    }

    pub fn print_report(&self, report: &IngestReport) {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
            return;
        }
        println!("feeds:   {} ok, {} failed", report.feeds_ok, report.feeds_failed);
        println!("tokens:  {} created, {} refreshed", report.created, report.refreshed);
        println!(
            "skipped: {} other chain, {} ignored, {} failed",
            report.skipped_chain, report.skipped_ignored, report.failed_entries
        );
    }
}

// Format a price to a human-readable string
fn format_price(price: f64) -> String {
    match Decimal::from_f64(price) {
        Some(d) if d.is_zero() => "0".to_string(),
        Some(d) => d.round_dp(8).normalize().to_string(),
        None => price.to_string(),
    }
}
