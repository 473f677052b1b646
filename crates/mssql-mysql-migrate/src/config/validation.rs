//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.connection_string.trim().is_empty() {
        return Err(MigrateError::Config(
            "source.connection_string is required".into(),
        ));
    }
    if config.target.connection_string.trim().is_empty() {
        return Err(MigrateError::Config(
            "target.connection_string is required".into(),
        ));
    }

    if let Some(schema) = &config.source.schema {
        if schema.trim().is_empty() {
            return Err(MigrateError::Config(
                "source.schema must not be empty when set".into(),
            ));
        }
    }

    // Cannot migrate onto the source
    if config.source.connection_string.trim() == config.target.connection_string.trim() {
        return Err(MigrateError::Config(
            "source and target cannot be the same database".into(),
        ));
    }

    Ok(())
}
