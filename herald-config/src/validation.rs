//! Custom validation functions for configuration.

use validator::ValidationError;

/// Validate that a class prefix is a plain CSS identifier, since it is
/// concatenated with the status kind to build class names.
pub fn validate_class_prefix(prefix: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^-?[A-Za-z_][A-Za-z0-9_-]*$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(prefix) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_class_prefix"))
    }
}

/// Validate log level.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}
