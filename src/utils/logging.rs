//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Alumnet application.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "alumnet.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(())
}

/// Log registration lifecycle actions with structured data
pub fn log_registration_action(event_id: i64, user_id: i64, action: &str, details: Option<&str>) {
    info!(
        event_id = event_id,
        user_id = user_id,
        action = action,
        details = details,
        "Registration action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log cache eviction outcomes
pub fn log_cache_eviction(mutation: &str, patterns: usize, deleted: u64) {
    tracing::debug!(
        mutation = mutation,
        patterns = patterns,
        deleted = deleted,
        "Cache entries evicted"
    );
}
