use serde::{Deserialize, Serialize};

/// One scraped listing card.
///
/// Every field except `scraped_timestamp` is best-effort: markup the card
/// happens to be missing leaves the field empty rather than rejecting the
/// row. Records are immutable once built and persist verbatim through the
/// checkpoint and output CSV files, so the field order here is the column
/// order on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub title: Option<String>,
    pub listing_url: Option<String>,
    pub area_raw: Option<String>,
    pub status: Option<String>,
    pub floor: Option<String>,
    pub transaction: Option<String>,
    pub furnishing: Option<String>,
    pub facing: Option<String>,
    pub bhk: Option<u32>,
    pub locality: Option<String>,
    pub property_id: Option<String>,
    pub scraped_timestamp: String,
    pub price_raw: Option<String>,
}
