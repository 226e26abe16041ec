//! Checks on individual settings values.

use crate::error::ConfigError;

/// PostgreSQL identifier used for the entity schema: letters, digits and `_`, not starting with a digit, at most 63 bytes.
pub fn validate_identifier(key: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key,
        reason: format!("'{}' {}", value, reason),
    };
    if value.is_empty() {
        return Err(invalid("is empty"));
    }
    if value.len() > 63 {
        return Err(invalid("is longer than 63 bytes"));
    }
    if value.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("starts with a digit"));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("may only contain ASCII letters, digits and '_'"));
    }
    Ok(())
}

/// Route prefix the controller is nested under. Must start with `/` and not end with one.
pub fn validate_base_path(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("'{}' must start with '/'", value),
        });
    }
    if value.len() > 1 && value.ends_with('/') {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("'{}' must not end with '/'", value),
        });
    }
    if value == "/" {
        return Err(ConfigError::Invalid {
            key,
            reason: "the controller cannot be mounted at the root".into(),
        });
    }
    Ok(())
}
