use super::{AppConfig, ConfigError};
use crate::fc::tree::is_valid_tag_name;

/// Upper bound for `extraction.max_nesting_depth`.
pub const MAX_NESTING_DEPTH_LIMIT: usize = 256;

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_extraction_config(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.host.trim().is_empty() {
        return Err(validation_err("server.host cannot be empty"));
    }
    if server.port == 0 {
        return Err(validation_err("server.port must be greater than 0"));
    }
    if server.max_body_bytes == 0 {
        return Err(validation_err(
            "server.max_body_bytes must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_extraction_config(config: &AppConfig) -> Result<(), ConfigError> {
    let extraction = &config.extraction;
    if !is_valid_tag_name(&extraction.block_tag) {
        return Err(validation_err(format!(
            "extraction.block_tag '{}' is not a valid tag name",
            extraction.block_tag
        )));
    }
    if extraction.max_nesting_depth == 0 || extraction.max_nesting_depth > MAX_NESTING_DEPTH_LIMIT
    {
        return Err(validation_err(format!(
            "extraction.max_nesting_depth must be between 1 and {MAX_NESTING_DEPTH_LIMIT}"
        )));
    }
    Ok(())
}

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let valid_levels = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];
    if !valid_levels.contains(&config.features.log_level.to_uppercase().as_str()) {
        return Err(validation_err(format!(
            "log_level must be one of {valid_levels:?}"
        )));
    }
    Ok(())
}
