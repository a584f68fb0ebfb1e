//! Crawl pipeline: page fetching, card parsing, and the pagination loop

pub mod card;
pub mod controller;
pub mod fetcher;

pub use card::{parse_card, parse_cards, CARD_SELECTOR};
pub use controller::{Crawler, PAGE_SIZE};
pub use fetcher::{build_http_client, FetchOutcome, HttpPageFetcher, PageFetcher};
