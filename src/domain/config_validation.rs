//! Configuration validation.
//!
//! Validates the `[pipeline]` section before any data is loaded.

use crate::domain::error::PipelineError;
use crate::domain::series::DuplicatePolicy;
use crate::ports::config_port::ConfigPort;

pub const SECTION: &str = "pipeline";

pub fn validate_pipeline_config(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    validate_positive_int(config, "window_size")?;
    validate_positive_int(config, "ewma_span")?;
    validate_bool(config, "normalize")?;
    validate_bool(config, "dropna")?;
    validate_timestamp_column(config)?;
    validate_duplicates(config)?;
    Ok(())
}

fn invalid(key: &str, reason: String) -> PipelineError {
    PipelineError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_positive_int(config: &dyn ConfigPort, key: &str) -> Result<(), PipelineError> {
    let Some(raw) = config.get_string(SECTION, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 => Ok(()),
        Ok(_) => Err(invalid(key, format!("{key} must be a positive integer"))),
        Err(_) => Err(invalid(key, format!("'{raw}' is not an integer"))),
    }
}

fn validate_bool(config: &dyn ConfigPort, key: &str) -> Result<(), PipelineError> {
    let Some(raw) = config.get_string(SECTION, key) else {
        return Ok(());
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "false" | "no" | "0" => Ok(()),
        _ => Err(invalid(key, format!("'{raw}' is not a boolean"))),
    }
}

fn validate_timestamp_column(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    match config.get_string(SECTION, "timestamp_column") {
        Some(name) if name.trim().is_empty() => Err(invalid(
            "timestamp_column",
            "timestamp_column must not be empty".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_duplicates(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    match config.get_string(SECTION, "duplicates") {
        Some(raw) => raw
            .parse::<DuplicatePolicy>()
            .map(|_| ())
            .map_err(|reason| invalid("duplicates", reason)),
        None => Ok(()),
    }
}
