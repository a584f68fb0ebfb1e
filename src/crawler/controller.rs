//! Crawl controller - main pagination loop
//!
//! Drives the paginated search results crawl:
//! - Resuming from a checkpoint when one exists
//! - Fetching pages through the injected [`PageFetcher`]
//! - Parsing cards and accumulating records
//! - Periodic checkpointing and limit enforcement
//! - Courtesy delays between requests
//!
//! The loop has three graceful stop conditions besides the configured
//! limits: a render timeout (taken as a block/redirect signal), a page with
//! zero cards (end of results), and the record cap being hit mid-page. On
//! every exit path, including errors, the accumulated records are written
//! to the output file first.

use crate::config::Config;
use crate::crawler::card;
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::records::ListingRecord;
use crate::storage::{self, checkpoint, CheckpointMeta};
use rand::Rng;
use std::path::Path;
use std::time::Duration;

/// Listings per search results page, fixed by the site
pub const PAGE_SIZE: usize = 30;

/// Settle delay after a page renders, in seconds
const SETTLE_DELAY_SECS: (f64, f64) = (0.5, 1.5);

/// Delay between page fetches, in seconds. Strictly longer than the settle
/// delay; this is the rate-limit contract with the site.
const PAGE_DELAY_SECS: (f64, f64) = (5.0, 10.0);

/// Main crawler structure
///
/// Owns the page-fetching resource for the duration of the crawl; dropping
/// the crawler releases it on every exit path.
pub struct Crawler<F: PageFetcher> {
    config: Config,
    fetcher: F,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Runs the crawl to completion and returns the accumulated records
    ///
    /// Resumes from the checkpoint when one exists. Whatever happens inside
    /// the loop, the final record sequence is persisted to the listings
    /// output file before this returns, and the page-fetching resource is
    /// released on every exit path.
    pub async fn run(self) -> crate::Result<Vec<ListingRecord>> {
        let checkpoint_path = Path::new(&self.config.output.checkpoint_path).to_path_buf();
        let meta_path = self.config.output.checkpoint_meta_path();

        let (mut records, mut page) =
            match checkpoint::load_resume_state(&checkpoint_path, &meta_path, PAGE_SIZE)? {
                Some(state) => {
                    tracing::info!(
                        "Resuming from checkpoint: {} records, continuing at page {}",
                        state.records.len(),
                        state.next_page
                    );
                    (state.records, state.next_page)
                }
                None => {
                    tracing::info!("No checkpoint found, starting fresh at page 1");
                    (Vec::new(), 1)
                }
            };

        let outcome = self.crawl_pages(&mut records, &mut page).await;

        // Persist whatever was accumulated before surfacing any error
        storage::save_listings(Path::new(&self.config.output.listings_path), &records)?;
        tracing::info!("Scraping finished. Total records: {}", records.len());

        outcome?;
        Ok(records)
    }

    /// The pagination loop proper
    async fn crawl_pages(
        &self,
        records: &mut Vec<ListingRecord>,
        page: &mut u32,
    ) -> crate::Result<()> {
        let checkpoint_path = Path::new(&self.config.output.checkpoint_path).to_path_buf();
        let meta_path = self.config.output.checkpoint_meta_path();
        let timeout = Duration::from_secs(self.config.crawl.page_timeout_secs);

        loop {
            let url = self.page_url(*page);
            tracing::info!("Loading page {}", page);

            let html = match self.fetcher.fetch(&url, card::CARD_SELECTOR, timeout).await? {
                FetchOutcome::Rendered(html) => html,
                FetchOutcome::Timeout => {
                    tracing::warn!(
                        "Timeout waiting for cards on page {}; assuming content block",
                        page
                    );
                    return Ok(());
                }
            };

            // Brief pause after the render, like a reader glancing at the page
            sleep_range(SETTLE_DELAY_SECS).await;

            let parsed = card::parse_cards(&html);
            if parsed.is_empty() {
                tracing::warn!("No cards found on page {}; end of results or block", page);
                return Ok(());
            }
            let card_count = parsed.len();

            let mut limit_reached = false;
            for record in parsed {
                records.push(record);

                if records.len() >= self.config.crawl.max_records {
                    tracing::info!(
                        "Reached max_records limit ({})",
                        self.config.crawl.max_records
                    );
                    limit_reached = true;
                    break;
                }

                if records.len() % self.config.crawl.checkpoint_every == 0 {
                    storage::save_listings(&checkpoint_path, records)?;
                    tracing::info!("Checkpoint saved ({} records)", records.len());
                }
            }

            tracing::info!("Page {} done: {} listings", page, card_count);
            checkpoint::save_meta(
                &meta_path,
                &CheckpointMeta {
                    completed_page: *page,
                    record_count: records.len(),
                },
            )?;
            *page += 1;

            if limit_reached {
                return Ok(());
            }

            if let Some(max_pages) = self.config.crawl.max_pages {
                if *page > max_pages {
                    tracing::info!("Reached max_pages limit ({})", max_pages);
                    return Ok(());
                }
            }

            sleep_range(PAGE_DELAY_SECS).await;
        }
    }

    /// Appends the page-number parameter to the base search URL
    fn page_url(&self, page: u32) -> String {
        let base = &self.config.crawl.base_url;
        if base.contains('?') {
            format!("{}&page={}", base, page)
        } else {
            format!("{}?page={}", base, page)
        }
    }
}

/// Sleeps for a duration drawn uniformly from `range` seconds
async fn sleep_range(range: (f64, f64)) {
    let seconds = {
        let mut rng = rand::thread_rng();
        rng.gen_range(range.0..range.1)
    };
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
}
