//! Alumnet backend
//!
//! Backend service for an alumni association: event creation and
//! registration, per-event merchandise ordering, custom registration
//! forms, email notifications and admin tooling, served as a JSON HTTP
//! API over PostgreSQL with a Redis read cache.

pub mod api;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{AlumnetError, Result};

// Re-export main components for easy access
pub use api::AppState;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
