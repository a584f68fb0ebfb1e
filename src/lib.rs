//! Brickscout: a resumable real-estate listing scraper
//!
//! This crate crawls paginated MagicBricks search results for Noida
//! residential listings, extracts card-level fields with graceful
//! degradation, and enriches cleaned records with coordinates, postal codes
//! and metro proximity obtained from Nominatim behind persistent caches.

pub mod config;
pub mod crawler;
pub mod geo;
pub mod records;
pub mod storage;

use thiserror::Error;

/// Main error type for Brickscout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Geocoding failed for {query}: {message}")]
    Geocode { query: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Brickscout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use records::{EnrichedRecord, ListingRecord};
