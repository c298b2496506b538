//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{AlumnetError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_email_config(&settings.email, settings.features.email_notifications)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate HTTP server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(AlumnetError::Config("Server host is required".to_string()));
    }

    if config.port == 0 {
        return Err(AlumnetError::Config(
            "Server port must be greater than 0".to_string(),
        ));
    }

    if config.rate_limit_requests == 0 {
        return Err(AlumnetError::Config(
            "Rate limit must allow at least one request per window".to_string(),
        ));
    }

    if config.rate_limit_window_seconds == 0 {
        return Err(AlumnetError::Config(
            "Rate limit window must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AlumnetError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(AlumnetError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(AlumnetError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AlumnetError::Config("Redis URL is required".to_string()));
    }

    if config.ttl_seconds == 0 {
        return Err(AlumnetError::Config(
            "Cache TTL must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate auth configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.is_empty() {
        return Err(AlumnetError::Config("JWT secret is required".to_string()));
    }

    if config.jwt_secret.len() < 32 {
        return Err(AlumnetError::Config(
            "JWT secret must be at least 32 bytes".to_string(),
        ));
    }

    Ok(())
}

/// Validate email configuration
fn validate_email_config(config: &super::EmailConfig, notifications_enabled: bool) -> Result<()> {
    if !notifications_enabled {
        return Ok(());
    }

    if config.smtp_host.is_empty() {
        return Err(AlumnetError::Config("SMTP host is required".to_string()));
    }

    if config.from_address.is_empty() || !config.from_address.contains('@') {
        return Err(AlumnetError::Config(
            "A valid from address is required".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AlumnetError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(AlumnetError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
