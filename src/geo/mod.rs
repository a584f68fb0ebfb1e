//! Geocoding enrichment: caches, provider capability, station table

pub mod cache;
pub mod enricher;
pub mod provider;
pub mod stations;

pub use cache::GeoCache;
pub use enricher::{CachedCoords, GeoEnricher, PINCODE_PLACEHOLDER};
pub use provider::{Coordinates, GeocodeProvider, NominatimClient, ReverseAddress};
pub use stations::{haversine_km, nearest_metro_distance_km, METRO_STATIONS};
