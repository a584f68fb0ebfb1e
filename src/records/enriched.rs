use crate::records::ListingRecord;
use serde::{Deserialize, Serialize};

/// A listing record after geocoding enrichment.
///
/// Carries every listing column plus the four derived ones. The derived
/// fields stay `None` until the enricher either resolves or imputes them,
/// so a fully enriched file has no empty cells in the new columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
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
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub official_pincode: Option<String>,
    pub dist_to_nearest_metro_km: Option<f64>,
}

impl EnrichedRecord {
    /// Wraps a listing record with the derived columns still unset
    pub fn from_listing(listing: ListingRecord) -> Self {
        Self {
            title: listing.title,
            listing_url: listing.listing_url,
            area_raw: listing.area_raw,
            status: listing.status,
            floor: listing.floor,
            transaction: listing.transaction,
            furnishing: listing.furnishing,
            facing: listing.facing,
            bhk: listing.bhk,
            locality: listing.locality,
            property_id: listing.property_id,
            scraped_timestamp: listing.scraped_timestamp,
            price_raw: listing.price_raw,
            latitude: None,
            longitude: None,
            official_pincode: None,
            dist_to_nearest_metro_km: None,
        }
    }
}
