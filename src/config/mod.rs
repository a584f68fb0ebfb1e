//! Configuration module for Brickscout
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every option has a compiled-in default, so the binary runs without
//! a config file at all.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, GeocodeConfig, OutputConfig, UserAgentConfig, DEFAULT_SEARCH_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
