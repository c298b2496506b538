//! Database module
//!
//! This module handles database connections and operations

pub mod connection;
pub mod repositories;
pub mod store;

// Re-export commonly used database components
pub use connection::{create_pool, health_check, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::{
    EventRepository, MerchandiseRepository, RegistrationRepository, UserRepository,
};
pub use store::{
    EventStore, MerchandiseStore, RegistrationDetail, RegistrationStore, RegistrationTotals,
    StatusCount, UserStore,
};
