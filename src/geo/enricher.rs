//! Geocoding enrichment stage
//!
//! Takes a cleaned listing set and adds four columns: latitude, longitude,
//! official pincode, and distance to the nearest metro station. Both lookup
//! directions go through persistent caches so re-runs cost no network
//! traffic, and every network call is preceded by a randomized courtesy
//! delay. Negative outcomes, including transport failures, are cached as
//! sentinels so a bad query is asked at most once.

use crate::geo::cache::GeoCache;
use crate::geo::provider::GeocodeProvider;
use crate::geo::stations;
use crate::records::{EnrichedRecord, ListingRecord};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Delay before every forward or reverse network call, in seconds.
/// Nominatim allows at most one request per second; this range is the
/// rate-limit contract and must not be shortened.
const COURTESY_DELAY_SECS: (f64, f64) = (1.5, 2.0);

/// Pincode used when no record yields one to impute from
pub const PINCODE_PLACEHOLDER: &str = "N/A";

/// Forward-cache value: coordinates, or the all-empty not-found sentinel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedCoords {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl CachedCoords {
    /// The not-found sentinel
    pub fn missing() -> Self {
        Self {
            lat: None,
            lng: None,
        }
    }
}

/// Enrichment driver owning the provider and both caches
pub struct GeoEnricher<P: GeocodeProvider> {
    provider: P,
    forward: GeoCache<CachedCoords>,
    reverse: GeoCache<Option<String>>,
    city: String,
}

impl<P: GeocodeProvider> GeoEnricher<P> {
    pub fn new(
        provider: P,
        forward: GeoCache<CachedCoords>,
        reverse: GeoCache<Option<String>>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            forward,
            reverse,
            city: city.into(),
        }
    }

    /// Enriches a record set with coordinates, pincode and metro distance
    ///
    /// Lookups are sequential; localities resolve once each and the result
    /// is applied to every record sharing the locality. Missing values in
    /// the four new columns are imputed at the end.
    pub async fn enrich(
        &mut self,
        records: Vec<ListingRecord>,
    ) -> crate::Result<Vec<EnrichedRecord>> {
        let localities = distinct_localities(&records);
        tracing::info!(
            "Forward geocoding {} distinct localities across {} records",
            localities.len(),
            records.len()
        );
        for locality in &localities {
            self.resolve_coordinates(locality).await?;
        }

        let mut enriched: Vec<EnrichedRecord> =
            records.into_iter().map(EnrichedRecord::from_listing).collect();

        for record in &mut enriched {
            if let Some(locality) = record.locality.clone() {
                let key = self.forward_key(&locality);
                if let Some(coords) = self.forward.lookup(&key) {
                    record.latitude = coords.lat;
                    record.longitude = coords.lng;
                }
            }
        }

        tracing::info!("Reverse geocoding pincodes");
        for record in &mut enriched {
            if let (Some(lat), Some(lng)) = (record.latitude, record.longitude) {
                record.official_pincode = self.resolve_pincode(lat, lng).await?;
            }
        }

        for record in &mut enriched {
            if let (Some(lat), Some(lng)) = (record.latitude, record.longitude) {
                record.dist_to_nearest_metro_km =
                    Some(stations::nearest_metro_distance_km(lat, lng));
            }
        }

        impute(&mut enriched);
        Ok(enriched)
    }

    fn forward_key(&self, locality: &str) -> String {
        format!("{}, {}", locality, self.city)
    }

    /// Ensures the forward cache holds an entry for this locality
    ///
    /// Cache hits return immediately. On a miss, waits out the courtesy
    /// delay and asks the provider; not-found and transport failures both
    /// persist the sentinel so the query is never retried.
    async fn resolve_coordinates(&mut self, locality: &str) -> crate::Result<()> {
        let key = self.forward_key(locality);
        if self.forward.lookup(&key).is_some() {
            return Ok(());
        }

        courtesy_delay().await;
        let coords = match self.provider.forward(&key).await {
            Ok(Some(coords)) => CachedCoords {
                lat: Some(coords.lat),
                lng: Some(coords.lng),
            },
            Ok(None) => {
                tracing::warn!("No forward geocoding result for '{}'", key);
                CachedCoords::missing()
            }
            Err(e) => {
                tracing::warn!("Forward geocoding failed for '{}': {}", key, e);
                CachedCoords::missing()
            }
        };
        self.forward.store(&key, coords)
    }

    /// Resolves a pincode through the reverse cache
    async fn resolve_pincode(&mut self, lat: f64, lng: f64) -> crate::Result<Option<String>> {
        let key = format!("{},{}", lat, lng);
        if let Some(cached) = self.reverse.lookup(&key) {
            return Ok(cached.clone());
        }

        courtesy_delay().await;
        let pincode = match self.provider.reverse(lat, lng).await {
            Ok(Some(address)) => address.postcode,
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Reverse geocoding failed for {}: {}", key, e);
                None
            }
        };
        self.reverse.store(&key, pincode.clone())?;
        Ok(pincode)
    }
}

/// Distinct non-empty localities in first-seen order
fn distinct_localities(records: &[ListingRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut localities = Vec::new();
    for record in records {
        if let Some(locality) = &record.locality {
            if seen.insert(locality.clone()) {
                localities.push(locality.clone());
            }
        }
    }
    localities
}

/// Fills the four derived columns where lookups came up empty
///
/// The pincode takes the modal value among resolved codes; the numeric
/// columns take their median. With nothing to impute from, the pincode
/// falls back to a placeholder and the numerics to zero.
fn impute(records: &mut [EnrichedRecord]) {
    let fallback_pincode =
        mode(records.iter().filter_map(|r| r.official_pincode.clone()))
            .unwrap_or_else(|| PINCODE_PLACEHOLDER.to_string());
    for record in records.iter_mut() {
        if record.official_pincode.is_none() {
            record.official_pincode = Some(fallback_pincode.clone());
        }
    }

    impute_numeric(records, |r| r.latitude, |r, v| r.latitude = Some(v));
    impute_numeric(records, |r| r.longitude, |r, v| r.longitude = Some(v));
    impute_numeric(
        records,
        |r| r.dist_to_nearest_metro_km,
        |r, v| r.dist_to_nearest_metro_km = Some(v),
    );
}

fn impute_numeric(
    records: &mut [EnrichedRecord],
    get: fn(&EnrichedRecord) -> Option<f64>,
    set: fn(&mut EnrichedRecord, f64),
) {
    let fill = median(records.iter().filter_map(get).collect()).unwrap_or(0.0);
    for record in records.iter_mut() {
        if get(record).is_none() {
            set(record, fill);
        }
    }
}

/// Median of the given values; None when empty
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Most frequent value; ties break toward the smaller string
fn mode(values: impl Iterator<Item = String>) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(value, _)| value)
}

async fn courtesy_delay() {
    let seconds = {
        let mut rng = rand::thread_rng();
        rng.gen_range(COURTESY_DELAY_SECS.0..COURTESY_DELAY_SECS.1)
    };
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::provider::{Coordinates, ReverseAddress};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct MockProvider {
        coords: Option<Coordinates>,
        postcode: Option<String>,
        fail: bool,
        forward_calls: AtomicUsize,
        reverse_calls: AtomicUsize,
    }

    impl MockProvider {
        fn returning(coords: Option<Coordinates>, postcode: Option<String>) -> Self {
            Self {
                coords,
                postcode,
                fail: false,
                forward_calls: AtomicUsize::new(0),
                reverse_calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                coords: None,
                postcode: None,
                fail: true,
                forward_calls: AtomicUsize::new(0),
                reverse_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GeocodeProvider for MockProvider {
        async fn forward(&self, query: &str) -> crate::Result<Option<Coordinates>> {
            self.forward_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(crate::ScoutError::Geocode {
                    query: query.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            Ok(self.coords)
        }

        async fn reverse(&self, _lat: f64, _lng: f64) -> crate::Result<Option<ReverseAddress>> {
            self.reverse_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(crate::ScoutError::Geocode {
                    query: "reverse".to_string(),
                    message: "connection reset".to_string(),
                });
            }
            Ok(Some(ReverseAddress {
                postcode: self.postcode.clone(),
            }))
        }
    }

    fn listing(locality: Option<&str>) -> ListingRecord {
        ListingRecord {
            title: locality.map(|l| format!("2 BHK Flat in {}", l)),
            listing_url: None,
            area_raw: None,
            status: None,
            floor: None,
            transaction: None,
            furnishing: None,
            facing: None,
            bhk: Some(2),
            locality: locality.map(str::to_string),
            property_id: None,
            scraped_timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            price_raw: None,
        }
    }

    fn caches(dir: &TempDir) -> (GeoCache<CachedCoords>, GeoCache<Option<String>>) {
        (
            GeoCache::load(dir.path().join("forward.json")),
            GeoCache::load(dir.path().join("reverse.json")),
        )
    }

    #[tokio::test]
    async fn test_fully_cached_enrichment_issues_no_network_calls() {
        let dir = TempDir::new().unwrap();
        let (mut forward, mut reverse) = caches(&dir);
        forward
            .store(
                "Sector 62, Noida, India",
                CachedCoords {
                    lat: Some(28.6146),
                    lng: Some(77.3666),
                },
            )
            .unwrap();
        reverse
            .store("28.6146,77.3666", Some("201301".to_string()))
            .unwrap();

        let provider = MockProvider::returning(None, None);
        let mut enricher = GeoEnricher::new(provider, forward, reverse, "Noida, India");

        let enriched = enricher
            .enrich(vec![listing(Some("Sector 62"))])
            .await
            .unwrap();

        assert_eq!(enriched[0].latitude, Some(28.6146));
        assert_eq!(enriched[0].longitude, Some(77.3666));
        assert_eq!(enriched[0].official_pincode.as_deref(), Some("201301"));
        assert_eq!(enricher.provider.forward_calls.load(Ordering::SeqCst), 0);
        assert_eq!(enricher.provider.reverse_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shared_locality_resolves_once() {
        let dir = TempDir::new().unwrap();
        let (forward, mut reverse) = caches(&dir);
        // Pre-seed the reverse side so only the forward miss hits the network
        reverse
            .store("28.6146,77.3666", Some("201301".to_string()))
            .unwrap();

        let provider = MockProvider::returning(
            Some(Coordinates {
                lat: 28.6146,
                lng: 77.3666,
            }),
            Some("201301".to_string()),
        );
        let mut enricher = GeoEnricher::new(provider, forward, reverse, "Noida, India");

        let enriched = enricher
            .enrich(vec![
                listing(Some("Sector 62")),
                listing(Some("Sector 62")),
                listing(Some("Sector 62")),
            ])
            .await
            .unwrap();

        assert_eq!(enricher.provider.forward_calls.load(Ordering::SeqCst), 1);
        assert!(enriched.iter().all(|r| r.latitude == Some(28.6146)));
    }

    #[tokio::test]
    async fn test_transport_failure_caches_the_sentinel() {
        let dir = TempDir::new().unwrap();
        let (forward, reverse) = caches(&dir);
        let provider = MockProvider::failing();
        let mut enricher = GeoEnricher::new(provider, forward, reverse, "Noida, India");

        let enriched = enricher
            .enrich(vec![listing(Some("Sector 9999"))])
            .await
            .unwrap();

        // The failure became a cached sentinel and imputation filled zeros
        assert_eq!(
            enricher.forward.lookup("Sector 9999, Noida, India"),
            Some(&CachedCoords::missing())
        );
        assert_eq!(enriched[0].latitude, Some(0.0));
        assert_eq!(enriched[0].longitude, Some(0.0));
        assert_eq!(enriched[0].dist_to_nearest_metro_km, Some(0.0));
        assert_eq!(
            enriched[0].official_pincode.as_deref(),
            Some(PINCODE_PLACEHOLDER)
        );
        // Without coordinates the reverse side is never consulted
        assert_eq!(enricher.provider.reverse_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_metro_distance_applied_from_cached_coords() {
        let dir = TempDir::new().unwrap();
        let (mut forward, mut reverse) = caches(&dir);
        // Exactly the Sector 62 station
        forward
            .store(
                "Sector 62, Noida, India",
                CachedCoords {
                    lat: Some(28.6146),
                    lng: Some(77.3666),
                },
            )
            .unwrap();
        reverse.store("28.6146,77.3666", None).unwrap();

        let provider = MockProvider::returning(None, None);
        let mut enricher = GeoEnricher::new(provider, forward, reverse, "Noida, India");

        let enriched = enricher
            .enrich(vec![listing(Some("Sector 62"))])
            .await
            .unwrap();
        assert!(enriched[0].dist_to_nearest_metro_km.unwrap() < 1e-9);
    }

    #[test]
    fn test_distinct_localities_keeps_first_seen_order() {
        let records = vec![
            listing(Some("Sector 62")),
            listing(None),
            listing(Some("Sector 18")),
            listing(Some("Sector 62")),
        ];
        assert_eq!(
            distinct_localities(&records),
            vec!["Sector 62".to_string(), "Sector 18".to_string()]
        );
    }

    #[test]
    fn test_median_odd_even_empty() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(vec![]), None);
    }

    #[test]
    fn test_mode_prefers_most_frequent_then_smallest() {
        let values = ["b", "a", "b"].iter().map(|s| s.to_string());
        assert_eq!(mode(values), Some("b".to_string()));

        let tied = ["b", "a"].iter().map(|s| s.to_string());
        assert_eq!(mode(tied), Some("a".to_string()));

        assert_eq!(mode(std::iter::empty()), None);
    }

    #[test]
    fn test_impute_fills_only_missing_cells() {
        let mut records: Vec<EnrichedRecord> = vec![
            listing(Some("Sector 62")),
            listing(Some("Sector 18")),
            listing(None),
        ]
        .into_iter()
        .map(EnrichedRecord::from_listing)
        .collect();

        records[0].latitude = Some(28.0);
        records[0].longitude = Some(77.0);
        records[0].official_pincode = Some("201301".to_string());
        records[0].dist_to_nearest_metro_km = Some(2.0);
        records[1].latitude = Some(30.0);
        records[1].longitude = Some(79.0);
        records[1].official_pincode = Some("201301".to_string());
        records[1].dist_to_nearest_metro_km = Some(4.0);

        impute(&mut records);

        assert_eq!(records[2].latitude, Some(29.0));
        assert_eq!(records[2].longitude, Some(78.0));
        assert_eq!(records[2].dist_to_nearest_metro_km, Some(3.0));
        assert_eq!(records[2].official_pincode.as_deref(), Some("201301"));
        // Present cells are untouched
        assert_eq!(records[0].latitude, Some(28.0));
    }
}
