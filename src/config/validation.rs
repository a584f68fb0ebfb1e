use crate::config::types::{Config, CrawlConfig, GeocodeConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_geocode_config(&config.geocode)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl loop configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if config.max_records < 1 {
        return Err(ConfigError::Validation(format!(
            "max_records must be >= 1, got {}",
            config.max_records
        )));
    }

    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_every must be >= 1, got {}",
            config.checkpoint_every
        )));
    }

    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "page_timeout_secs must be >= 1, got {}",
            config.page_timeout_secs
        )));
    }

    if let Some(max_pages) = config.max_pages {
        if max_pages < 1 {
            return Err(ConfigError::Validation(
                "max_pages must be >= 1 when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates geocoding configuration
fn validate_geocode_config(config: &GeocodeConfig) -> Result<(), ConfigError> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid geocode endpoint: {}", e)))?;

    if config.city.trim().is_empty() {
        return Err(ConfigError::Validation(
            "geocode city suffix cannot be empty".to_string(),
        ));
    }

    if config.input_path.is_empty() {
        return Err(ConfigError::Validation(
            "geocode input_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    if !config.contact_email.contains('@') || config.contact_email.len() < 3 {
        return Err(ConfigError::Validation(format!(
            "contact_email does not look like an email address: '{}'",
            config.contact_email
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("listings_path", &config.listings_path),
        ("checkpoint_path", &config.checkpoint_path),
        ("enriched_path", &config.enriched_path),
        ("forward_cache_path", &config.forward_cache_path),
        ("reverse_cache_path", &config.reverse_cache_path),
    ] {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}
