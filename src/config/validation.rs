//! Configuration validation

use crate::config::types::Config;
use crate::ConfigError;

/// Longest base delay that still makes progress against the 30 s ceiling
const MAX_BASE_DELAY_MS: u64 = 30_000;

/// Validates a configuration, returning the first problem found
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.search.results_per_page == 0 {
        return Err(invalid("search.results-per-page must be at least 1"));
    }
    if config.search.viewport_dist == 0 {
        return Err(invalid("search.viewport-dist must be at least 1"));
    }
    if config.search.max_workers == 0 {
        return Err(invalid("search.max-workers must be at least 1"));
    }
    if config.search.base_delay_ms > MAX_BASE_DELAY_MS {
        return Err(invalid(
            "search.base-delay-ms must not exceed the 30s delay ceiling",
        ));
    }
    if config.enrichment.base_delay_ms > MAX_BASE_DELAY_MS {
        return Err(invalid(
            "enrichment.base-delay-ms must not exceed the 30s delay ceiling",
        ));
    }
    if config.enrichment.reviews_page_size == 0 {
        return Err(invalid("enrichment.reviews-page-size must be at least 1"));
    }
    if config.checkpoint.interval == 0 {
        return Err(invalid("checkpoint.interval must be at least 1"));
    }
    if config.checkpoint.enrichment_interval == 0 {
        return Err(invalid("checkpoint.enrichment-interval must be at least 1"));
    }
    if config.output.dir.is_empty() {
        return Err(invalid("output.dir must not be empty"));
    }
    if config.checkpoint.state_dir.is_empty() {
        return Err(invalid("checkpoint.state-dir must not be empty"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_string())
}
