//! Services module
//!
//! This module contains business logic services

pub mod cache;
pub mod dashboard;
pub mod eligibility;
pub mod event;
pub mod fees;
pub mod invalidation;
pub mod merchandise;
pub mod notification;
pub mod registration;

// Re-export commonly used services
pub use cache::{Cache, NoopCache, RedisCache};
pub use dashboard::{DashboardService, DashboardStats};
pub use eligibility::{
    modification_window, registration_window, ModificationDenied, ModificationWindow,
    RegistrationWindow,
};
pub use event::{EventDetail, EventService};
pub use fees::{fee_breakdown, FeeBreakdown, MerchandiseLine};
pub use invalidation::{evict_after, Mutation};
pub use merchandise::{AddCartLineRequest, MerchandiseService, UpdateCartLineRequest};
pub use notification::{NotificationService, Notifier, OutboundEmail, SmtpNotifier};
pub use registration::{
    MyRegistration, RegisterRequest, RegistrationOutcome, RegistrationService,
    UpdateMyRegistrationRequest,
};

use std::sync::Arc;

use crate::database::store::{EventStore, MerchandiseStore, RegistrationStore, UserStore};
use crate::database::{
    EventRepository, MerchandiseRepository, RegistrationRepository, UserRepository,
};

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub events: EventService,
    pub registrations: RegistrationService,
    pub merchandise: MerchandiseService,
    pub dashboard: DashboardService,
}

impl ServiceFactory {
    /// Wire services against any store implementations
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        merchandise: Arc<dyn MerchandiseStore>,
        users: Arc<dyn UserStore>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            events: EventService::new(Arc::clone(&events)),
            registrations: RegistrationService::new(
                Arc::clone(&events),
                Arc::clone(&registrations),
                Arc::clone(&users),
                notifications,
            ),
            merchandise: MerchandiseService::new(
                Arc::clone(&events),
                Arc::clone(&registrations),
                merchandise,
            ),
            dashboard: DashboardService::new(events, registrations, users),
        }
    }

    /// Wire services against the PostgreSQL repositories
    pub fn from_pool(pool: sqlx::PgPool, notifications: Arc<NotificationService>) -> Self {
        Self::new(
            Arc::new(EventRepository::new(pool.clone())),
            Arc::new(RegistrationRepository::new(pool.clone())),
            Arc::new(MerchandiseRepository::new(pool.clone())),
            Arc::new(UserRepository::new(pool)),
            notifications,
        )
    }
}
