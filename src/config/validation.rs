use crate::config::types::{Config, OutputConfig, ScraperConfig, TargetEntry, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates orchestration limits
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 50 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 50, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.queue_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "queue_limit must be >= 1, got {}",
            config.queue_limit
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.max_crawl_delay_ms < config.default_crawl_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_crawl_delay_ms ({}) must not be smaller than default_crawl_delay_ms ({})",
            config.max_crawl_delay_ms, config.default_crawl_delay_ms
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.dynamic_confidence_threshold > 100 {
        return Err(ConfigError::Validation(format!(
            "dynamic_confidence_threshold must be between 0 and 100, got {}",
            config.dynamic_confidence_threshold
        )));
    }

    if config.robots_cache_ttl_hours < 1 {
        return Err(ConfigError::Validation(format!(
            "robots_cache_ttl_hours must be >= 1, got {}",
            config.robots_cache_ttl_hours
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The crawler name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only letters, digits, '-' and '_', got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates `[[target]]` entries
fn validate_targets(targets: &[TargetEntry]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for target in targets {
        if target.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target id cannot be empty".to_string(),
            ));
        }

        if !seen_ids.insert(target.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate target id '{}'",
                target.id
            )));
        }

        if target.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "target '{}' must have a name",
                target.id
            )));
        }

        let url = Url::parse(&target.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid URL for target '{}': {}", target.id, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "target '{}' must use an http or https URL, got '{}'",
                target.id, target.url
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
