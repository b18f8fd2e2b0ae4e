//! YAML parser for harvest job files
//!
//! Parses and validates job files.

use crate::config::types::HarvestConfig;
use crate::error::{Error, Result, ResultExt};
use std::fs;
use std::path::Path;
use url::Url;

/// Load a job file from disk
pub fn load_config(path: impl AsRef<Path>) -> Result<HarvestConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file '{}'", path.display()))?;
    load_config_from_str(&content)
}

/// Load a job from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<HarvestConfig> {
    let config: HarvestConfig =
        serde_yaml::from_str(yaml).context("Failed to parse job YAML")?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate a job
pub fn validate_config(config: &HarvestConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        return Err(Error::config("Job name cannot be empty"));
    }

    validate_url("search.url", &config.search.url)?;
    validate_url("batch.url", &config.batch.url)?;

    // Pagination limits
    let pagination = &config.search.pagination;
    if pagination.probe_limit == 0 {
        return Err(Error::invalid_value(
            "search.pagination.probe_limit",
            "must be greater than 0",
        ));
    }
    if pagination.page_size == 0 {
        return Err(Error::invalid_value(
            "search.pagination.page_size",
            "must be greater than 0",
        ));
    }
    if pagination.safety_cap < pagination.probe_limit {
        return Err(Error::invalid_value(
            "search.pagination.safety_cap",
            format!(
                "must be at least probe_limit ({})",
                pagination.probe_limit
            ),
        ));
    }
    if pagination.limit_param.trim().is_empty() {
        return Err(Error::invalid_value(
            "search.pagination.limit_param",
            "cannot be empty",
        ));
    }

    if config.search.id_fields.is_empty() && config.search.hit_id_fields.is_empty() {
        return Err(Error::config(
            "search.id_fields and search.hit_id_fields cannot both be empty",
        ));
    }

    if let Some(range) = &config.search.criteria.date_range {
        if range.from > range.to {
            return Err(Error::invalid_value(
                "search.criteria.date_range",
                format!("from ({}) is after to ({})", range.from, range.to),
            ));
        }
    }

    // Batch settings
    if config.batch.capacity == 0 {
        return Err(Error::invalid_value("batch.capacity", "must be greater than 0"));
    }
    if config.batch.concurrency == 0 {
        return Err(Error::invalid_value(
            "batch.concurrency",
            "must be greater than 0",
        ));
    }

    // Flattening
    if config.flatten.separator.is_empty() {
        return Err(Error::invalid_value("flatten.separator", "cannot be empty"));
    }

    if config.http.timeout_secs == 0 {
        return Err(Error::invalid_value(
            "http.timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.http.initial_backoff_ms > config.http.max_backoff_ms {
        return Err(Error::invalid_value(
            "http.initial_backoff_ms",
            format!(
                "must not exceed max_backoff_ms ({})",
                config.http.max_backoff_ms
            ),
        ));
    }

    if config.output.parquet.row_group_size == 0 {
        return Err(Error::invalid_value(
            "output.parquet.row_group_size",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_value(field, "cannot be empty"));
    }
    let url = Url::parse(value)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_value(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}
