use crate::fetch::PageFetcher;
use crate::models::{SchemaVariant, StoredListing};
use crate::scrapers;
use crate::store::ListingStore;
use anyhow::Result;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Why a single listing URL was dropped. Every variant maps to a log line
/// and a `continue`; nothing here ever aborts the page or the crawl.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch returned no content")]
    NoContent,
    #[error("listing has no images")]
    NoImages,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    /// Pagination stride: listings per search-results page.
    pub offset_step: u32,
    /// In-memory records accumulated before a mandatory flush.
    pub batch_size: usize,
    pub variant: SchemaVariant,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: format!("{}/lejeboliger/", scrapers::ORIGIN),
            offset_step: 18,
            batch_size: 200,
            variant: SchemaVariant::Extended,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CrawlStats {
    pub pages_crawled: u64,
    pub records_scraped: u64,
    pub records_inserted: u64,
    pub duplicates_skipped: u64,
    pub flush_attempts: u64,
}

/// Sequential pagination crawler: one index page at a time, then each of
/// its detail pages, batching normalized records toward the store.
pub struct Crawler<F, S> {
    fetcher: F,
    store: S,
    config: CrawlConfig,
    shutdown: Arc<AtomicBool>,
    batch: Vec<StoredListing>,
    stats: CrawlStats,
}

impl<F: PageFetcher, S: ListingStore> Crawler<F, S> {
    pub fn new(fetcher: F, store: S, config: CrawlConfig, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            fetcher,
            store,
            config,
            shutdown,
            batch: Vec::new(),
            stats: CrawlStats::default(),
        }
    }

    /// Run to completion or interruption. The final flush happens on every
    /// exit path; accumulated progress is never abandoned without a save
    /// attempt.
    pub async fn run(mut self) -> CrawlStats {
        info!("Starting crawl of {}", self.config.base_url);
        self.crawl_pages().await;
        self.flush_batch(true).await;
        info!(
            "Crawl finished: {} pages, {} records scraped, {} inserted, {} duplicates",
            self.stats.pages_crawled,
            self.stats.records_scraped,
            self.stats.records_inserted,
            self.stats.duplicates_skipped,
        );
        self.stats
    }

    async fn crawl_pages(&mut self) {
        let mut offset: u32 = 0;
        'pages: loop {
            if self.interrupted() {
                break;
            }

            let page_url = format!("{}?offset={}", self.config.base_url, offset);
            if let Some(html) = self.fetcher.fetch(&page_url).await {
                let urls = scrapers::parse_listing_urls(&html);
                if urls.is_empty() {
                    info!("No more listings found at offset {}, stopping", offset);
                    break;
                }

                for url in urls {
                    if self.interrupted() {
                        break 'pages;
                    }
                    match self.scrape_listing(&url).await {
                        Ok(listing) => {
                            self.batch.push(listing);
                            self.stats.records_scraped += 1;
                            if self.batch.len() >= self.config.batch_size {
                                self.flush_batch(false).await;
                            }
                        }
                        Err(reason) => warn!("Skipping {}: {}", url, reason),
                    }
                }

                self.stats.pages_crawled += 1;
                info!(
                    "Finished page at offset {} ({} records so far)",
                    offset, self.stats.records_scraped
                );
            }

            // The offset advances by one full page regardless of how many
            // detail pages succeeded.
            offset += self.config.offset_step;
        }
    }

    async fn scrape_listing(&self, url: &str) -> Result<StoredListing, SkipReason> {
        let html = self.fetcher.fetch(url).await.ok_or(SkipReason::NoContent)?;
        let details = scrapers::parse_listing_details(&html, self.config.variant, Utc::now());
        if details.images.is_empty() {
            return Err(SkipReason::NoImages);
        }
        Ok(StoredListing::from_details(&details, url))
    }

    /// Hand the batch to the store. A mid-crawl failure keeps the records
    /// for retry at the next cap crossing; a final-flush failure is logged
    /// and the batch dropped, since there is no later retry point.
    async fn flush_batch(&mut self, is_final: bool) {
        if self.batch.is_empty() {
            return;
        }
        self.stats.flush_attempts += 1;
        info!("Flushing {} records to store", self.batch.len());

        match self.save_batch().await {
            Ok(()) => self.batch.clear(),
            Err(e) if is_final => {
                error!("Error saving final batch: {:#}", e);
                self.batch.clear();
            }
            Err(e) => {
                error!("Error saving batch, keeping records for retry: {:#}", e);
            }
        }
    }

    async fn save_batch(&mut self) -> Result<()> {
        for listing in &self.batch {
            if self.store.exists(&listing.url).await? {
                info!("Skipping listing with URL: {} (duplicate)", listing.url);
                self.stats.duplicates_skipped += 1;
            } else {
                self.store.insert(listing).await?;
                self.stats.records_inserted += 1;
            }
        }
        Ok(())
    }

    fn interrupted(&self) -> bool {
        if self.shutdown.load(Ordering::Relaxed) {
            info!("Stop requested, saving progress");
            true
        } else {
            false
        }
    }
}
