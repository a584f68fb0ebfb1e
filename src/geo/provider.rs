//! Geocoding provider capability
//!
//! Forward and reverse lookups against a Nominatim instance. The trait
//! separates the three outcomes callers need to distinguish: a definitive
//! result (`Ok(Some)`), a definitive not-found (`Ok(None)`), and a
//! transient transport failure (`Err`). The enrichment layer decides what
//! to persist for each.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A resolved coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Address components returned by a reverse lookup
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReverseAddress {
    pub postcode: Option<String>,
}

/// Capability for forward and reverse geocoding
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Resolves a place-name query to coordinates
    async fn forward(&self, query: &str) -> crate::Result<Option<Coordinates>>;

    /// Resolves coordinates to address components
    async fn reverse(&self, lat: f64, lng: f64) -> crate::Result<Option<ReverseAddress>>;
}

/// Nominatim HTTP client
///
/// Nominatim's usage policy requires an identifying user agent, which is
/// built from the same identification config as the crawler's.
pub struct NominatimClient {
    client: Client,
    endpoint: String,
}

impl NominatimClient {
    pub fn new(endpoint: &str, config: &UserAgentConfig) -> crate::Result<Self> {
        let user_agent = format!(
            "{}/{} (+{}; {})",
            config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
        );
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

/// One hit from the search endpoint; Nominatim encodes coordinates as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Reverse endpoint response; the address block is absent on failures
#[derive(Debug, Deserialize)]
struct ReversePlace {
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[async_trait]
impl GeocodeProvider for NominatimClient {
    async fn forward(&self, query: &str) -> crate::Result<Option<Coordinates>> {
        let url = format!("{}/search", self.endpoint);
        let hits: Vec<SearchHit> = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };
        match (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) {
            (Ok(lat), Ok(lng)) => Ok(Some(Coordinates { lat, lng })),
            _ => Ok(None),
        }
    }

    async fn reverse(&self, lat: f64, lng: f64) -> crate::Result<Option<ReverseAddress>> {
        let url = format!("{}/reverse", self.endpoint);
        let place: ReversePlace = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(place.address)
    }
}
