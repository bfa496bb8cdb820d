mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::*;
use serde_json::json;
use token_resolver::sources::Pair;
use token_resolver::store::TokenStore;
use token_resolver::{CatalogIngestor, IngestReport, PriceSource};

const FEED: &str = "https://lists.example.org/kava.tokenlist.json";
const MISSING_FEED: &str = "https://lists.example.org/gone.json";
const STKAVA: &str = "0x3333333333333333333333333333333333333333";

fn kava_list() -> serde_json::Value {
    json!({
        "name": "Kava EVM",
        "tokens": [
            { "chainId": 2222, "address": "0xfA9343C3897324496A05fC75abeD6bAC29f8A40f",
              "name": "USD Coin", "symbol": "USDC", "decimals": 6,
              "logoURI": "https://example.org/usdc.png", "tags": ["stablecoin"] },
            { "chainId": 2222, "address": WKAVA, "name": "Wrapped Kava", "symbol": "WKAVA",
              "decimals": 18 },
            { "chainId": 1, "address": MEME, "name": "Meme", "symbol": "MEME", "decimals": 9 },
            { "chainId": 2222, "address": WETH, "name": "Wrapped Ether", "symbol": "WETH",
              "decimals": 18 },
            { "chainId": 2222, "symbol": "BROKEN", "decimals": 18 },
            { "chainId": 2222, "address": STKAVA, "name": "Staked Kava", "symbol": "stKAVA",
              "decimals": 18,
              "tags": ["liquid-staking"], "liquid_staked_address": WKAVA }
        ]
    })
}

fn ingestor(h: &Harness, http: FakeHttp) -> CatalogIngestor {
    let ignored: HashSet<String> = [WETH.to_string()].into_iter().collect();
    CatalogIngestor::new(Arc::new(h.resolver()), Arc::new(http), KAVA_CHAIN_ID, ignored)
}

fn harness() -> Harness {
    Harness::new(
        FakeChain::kava(),
        FakeScreener::default().with_pairs(WKAVA, vec![Pair::new("kava", Some("0.91"))]),
        FakeOracle::default(),
    )
}

#[tokio::test]
async fn ingests_matching_entries_and_skips_the_rest() {
    let h = harness();
    let ingestor = ingestor(&h, FakeHttp::default().with(FEED, kava_list()));

    let report = ingestor.ingest(&[MISSING_FEED.to_string(), FEED.to_string()]).await;
    assert_eq!(
        report,
        IngestReport {
            feeds_ok: 1,
            feeds_failed: 1,
            created: 3,
            refreshed: 0,
            skipped_chain: 1,
            skipped_ignored: 1,
            failed_entries: 1,
        }
    );

    assert_eq!(h.store.len(), 3);
    assert!(h.store.get(MEME).await.unwrap().is_none());
    assert!(h.store.get(WETH).await.unwrap().is_none());
}

#[tokio::test]
async fn records_carry_list_metadata_and_a_price() {
    let h = harness();
    let ingestor = ingestor(&h, FakeHttp::default().with(FEED, kava_list()));
    ingestor.ingest(&[FEED.to_string()]).await;

    let usdc = h.store.get(USDC).await.unwrap().unwrap();
    assert_eq!(usdc.name, "USD Coin");
    assert_eq!(usdc.logo_uri.as_deref(), Some("https://example.org/usdc.png"));
    assert!(usdc.stable);
    assert_eq!(usdc.price, 1.0);
    assert_eq!(usdc.price_source, Some(PriceSource::Peg));

    let wkava = h.store.get(WKAVA).await.unwrap().unwrap();
    assert!(!wkava.stable);
    assert_eq!(wkava.price, 0.91);

    let stkava = h.store.get(STKAVA).await.unwrap().unwrap();
    assert_eq!(stkava.symbol, "stKAVA");
    assert_eq!(stkava.liquid_staked_address.as_deref(), Some(WKAVA));
    assert_eq!(stkava.price, 0.0);

    // identity comes from the list, not from chain reads
    assert!(h.chain.calls() <= 2);
}

#[tokio::test]
async fn known_tokens_are_only_repriced() {
    let h = harness();
    let ingestor = ingestor(&h, FakeHttp::default().with(FEED, kava_list()));
    ingestor.ingest(&[FEED.to_string()]).await;
    let before = h.store.get(WKAVA).await.unwrap().unwrap();

    let report = ingestor.ingest(&[FEED.to_string()]).await;
    assert_eq!(report.created, 0);
    assert_eq!(report.refreshed, 3);
    assert_eq!(h.store.len(), 3);

    let after = h.store.get(WKAVA).await.unwrap().unwrap();
    assert!(after.same_identity(&before));
    assert_eq!(after.price, before.price);
}

#[tokio::test]
async fn feed_without_tokens_array_fails_the_feed_only() {
    let h = harness();
    let http = FakeHttp::default()
        .with(MISSING_FEED, json!({ "name": "not a list" }))
        .with(FEED, kava_list());
    let report = ingestor(&h, http).ingest(&[MISSING_FEED.to_string(), FEED.to_string()]).await;

    assert_eq!(report.feeds_failed, 1);
    assert_eq!(report.feeds_ok, 1);
    assert_eq!(report.created, 3);
}

#[tokio::test]
async fn local_json_file_feed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.json");
    std::fs::write(&path, serde_json::to_vec(&kava_list()).unwrap()).unwrap();

    let h = harness();
    let http = FakeHttp::default();
    let report = ingestor(&h, http).ingest(&[path.display().to_string()]).await;

    assert_eq!(report.feeds_ok, 1);
    assert_eq!(report.created, 3);
}

#[tokio::test]
async fn unreadable_local_file_is_a_failed_feed() {
    let h = harness();
    let feeds = ["/nonexistent/tokens.json".to_string()];
    let report = ingestor(&h, FakeHttp::default()).ingest(&feeds).await;
    assert_eq!(report.feeds_failed, 1);
    assert!(h.store.is_empty());
}
