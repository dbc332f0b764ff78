use super::types::{Config, FetchConfig, TransformConfig};
use super::ConfigError;

/// Validate configuration
/// Currently validates:
/// - Item count, pool widths and timeout are not 0
/// - Fetch and transform directories differ
/// - Base URL parses as an absolute http(s) URL
/// - JPEG quality is within 1..=100
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_fetch(&config.fetch)?;
    validate_transform(&config.transform)?;

    if config.fetch.output_dir == config.transform.output_dir {
        return invalid("fetch.output_dir and transform.output_dir must differ");
    }

    Ok(())
}

/// Checks the `[fetch]` section on its own.
pub fn validate_fetch(fetch: &FetchConfig) -> Result<(), ConfigError> {
    if fetch.count == 0 {
        return invalid("fetch.count cannot be 0");
    }
    if fetch.concurrency == 0 {
        return invalid("fetch.concurrency cannot be 0");
    }
    if fetch.timeout_secs == 0 {
        return invalid("fetch.timeout_secs cannot be 0");
    }
    if fetch.extension.is_empty() || fetch.extension.contains(['/', '.']) {
        return invalid("fetch.extension must be a bare extension like \"png\"");
    }

    match reqwest::Url::parse(&fetch.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(ConfigError::ValidationError(format!(
            "fetch.base_url has unsupported scheme: {}",
            url.scheme()
        ))),
        Err(e) => Err(ConfigError::ValidationError(format!(
            "fetch.base_url is invalid: {}",
            e
        ))),
    }
}

/// Checks the `[transform]` section on its own.
pub fn validate_transform(transform: &TransformConfig) -> Result<(), ConfigError> {
    if transform.concurrency == 0 {
        return invalid("transform.concurrency cannot be 0");
    }
    if !(1..=100).contains(&transform.quality) {
        return invalid("transform.quality must be between 1 and 100");
    }
    Ok(())
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.to_string()))
}
