use serde::Deserialize;

/// Default search results URL: Noida residential-for-sale, all covered
/// property types. The crawler appends a `page` parameter per fetch.
pub const DEFAULT_SEARCH_URL: &str = "https://www.magicbricks.com/property-for-sale/residential-real-estate?bedroom=1,3,4,5&proptype=Multistorey-Apartment,Builder-Floor-Apartment,Penthouse,Studio-Apartment,Residential-House,Villa&cityName=Noida";

/// Main configuration structure for Brickscout
///
/// Every section has compiled-in defaults, so running without a config file
/// behaves like the parameterless invocation the tool started out as.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub geocode: GeocodeConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            geocode: GeocodeConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Base search results URL; a page-number parameter is appended
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum number of result pages to visit (absent = unbounded)
    #[serde(rename = "max-pages")]
    pub max_pages: Option<u32>,

    /// Stop once this many records have been collected
    #[serde(rename = "max-records")]
    pub max_records: usize,

    /// Rewrite the checkpoint file every this many records
    #[serde(rename = "checkpoint-every")]
    pub checkpoint_every: usize,

    /// How long to wait for listing cards to appear on a fetched page
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_URL.to_string(),
            max_pages: None,
            max_records: 3200,
            checkpoint_every: 100,
            page_timeout_secs: 25,
        }
    }
}

/// Geocoding enrichment configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// Nominatim instance to query
    pub endpoint: String,

    /// Suffix appended to every locality when forward geocoding
    pub city: String,

    /// Cleaned listings CSV consumed by the enrichment stage
    #[serde(rename = "input-path")]
    pub input_path: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            city: "Noida, India".to_string(),
            input_path: "cleaned_noida_listings.csv".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "brickscout".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/brickscout".to_string(),
            contact_email: "ops@example.com".to_string(),
        }
    }
}

/// Output file configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Final listings CSV written at the end of a crawl
    #[serde(rename = "listings-path")]
    pub listings_path: String,

    /// Periodically rewritten crawl checkpoint CSV
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Enriched CSV written at the end of the geocoding stage
    #[serde(rename = "enriched-path")]
    pub enriched_path: String,

    /// Forward geocode cache file
    #[serde(rename = "forward-cache-path")]
    pub forward_cache_path: String,

    /// Reverse geocode cache file
    #[serde(rename = "reverse-cache-path")]
    pub reverse_cache_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            listings_path: "scraped_listings_cards.csv".to_string(),
            checkpoint_path: "checkpoint.csv".to_string(),
            enriched_path: "scraped_data.csv".to_string(),
            forward_cache_path: "geocode_cache.json".to_string(),
            reverse_cache_path: "reverse_geocode_cache.json".to_string(),
        }
    }
}

impl OutputConfig {
    /// Sidecar file recording the last completed page next to the checkpoint
    pub fn checkpoint_meta_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.checkpoint_path).with_extension("meta.json")
    }
}
