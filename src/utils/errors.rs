//! Error handling for Alumnet
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for the Alumnet application
#[derive(Error, Debug)]
pub enum AlumnetError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Email transport error: {0}")]
    EmailTransport(#[from] lettre::transport::smtp::Error),

    #[error("Email build error: {0}")]
    EmailBuild(#[from] lettre::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Registration not found for event {event_id}")]
    RegistrationNotFound { event_id: i64 },

    #[error("Registration not found: {registration_id}")]
    RegistrationMissing { registration_id: i64 },

    #[error("Guest not found: {guest_id}")]
    GuestNotFound { guest_id: i64 },

    #[error("Merchandise item not found: {item_id}")]
    MerchandiseItemNotFound { item_id: i64 },

    #[error("Cart line not found: {line_id}")]
    CartLineNotFound { line_id: i64 },

    #[error("Already registered for event {event_id}")]
    DuplicateRegistration { event_id: i64 },

    #[error("Registration is not open: {0}")]
    RegistrationNotOpen(String),

    #[error("Modification window closed: {0}")]
    ModificationClosed(String),

    #[error("Missing required fields: {labels:?}")]
    MissingRequiredFields { labels: Vec<String> },

    #[error("Insufficient stock for {item_name}: requested {requested}, available {available}")]
    InsufficientStock {
        item_name: String,
        requested: i32,
        available: i32,
    },

    #[error("Event has registrations and cannot be deleted: {event_id}")]
    EventHasRegistrations { event_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Result type alias for Alumnet operations
pub type Result<T> = std::result::Result<T, AlumnetError>;

impl AlumnetError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            AlumnetError::Database(_) => false,
            AlumnetError::Migration(_) => false,
            AlumnetError::Redis(_) => true,
            AlumnetError::EmailTransport(_) => true,
            AlumnetError::EmailBuild(_) => false,
            AlumnetError::Serialization(_) => false,
            AlumnetError::Io(_) => true,
            AlumnetError::Config(_) => false,
            AlumnetError::RateLimitExceeded => true,
            AlumnetError::ServiceUnavailable(_) => true,
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AlumnetError::Database(_) => ErrorSeverity::Critical,
            AlumnetError::Migration(_) => ErrorSeverity::Critical,
            AlumnetError::Config(_) => ErrorSeverity::Critical,
            AlumnetError::PermissionDenied(_) => ErrorSeverity::Warning,
            AlumnetError::Authentication(_) => ErrorSeverity::Warning,
            AlumnetError::RateLimitExceeded => ErrorSeverity::Warning,
            AlumnetError::InvalidInput(_) => ErrorSeverity::Info,
            AlumnetError::RegistrationNotOpen(_) => ErrorSeverity::Info,
            AlumnetError::ModificationClosed(_) => ErrorSeverity::Info,
            AlumnetError::MissingRequiredFields { .. } => ErrorSeverity::Info,
            AlumnetError::DuplicateRegistration { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
