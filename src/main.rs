mod config;
mod crawler;
mod fetch;
mod models;
mod normalize;
mod scrapers;
mod store;

use config::Config;
use crawler::{CrawlConfig, Crawler};
use fetch::{FetchConfig, HttpFetcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use store::SupabaseStore;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Bolig Scout - boligportal.dk crawler");
    info!("Press CTRL+C to stop; accumulated records are flushed on exit");

    let config = Config::from_env()?;
    let fetcher = HttpFetcher::new(FetchConfig::default())?;
    let store = SupabaseStore::new(&config.supabase_url, &config.supabase_key)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Failed to listen for CTRL+C");
            return;
        }
        info!("Interrupt received, finishing current fetch");
        flag.store(true, Ordering::Relaxed);
    });

    let crawler = Crawler::new(fetcher, store, CrawlConfig::default(), shutdown);
    let stats = crawler.run().await;

    println!(
        "Done: {} pages, {} records scraped, {} inserted, {} duplicates skipped",
        stats.pages_crawled,
        stats.records_scraped,
        stats.records_inserted,
        stats.duplicates_skipped
    );

    Ok(())
}
