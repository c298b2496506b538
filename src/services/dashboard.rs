//! Admin dashboard aggregates

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::database::store::{EventStore, RegistrationStore, RegistrationTotals, StatusCount, UserStore};
use crate::utils::errors::Result;

/// Aggregates shown on the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub events_by_status: Vec<StatusCount>,
    pub registrations: RegistrationTotals,
    pub member_count: i64,
}

#[derive(Clone)]
pub struct DashboardService {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
    users: Arc<dyn UserStore>,
}

impl DashboardService {
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            events,
            registrations,
            users,
        }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        let events_by_status = self.events.count_by_status().await?;
        let registrations = self.registrations.totals().await?;
        let member_count = self.users.count().await?;

        Ok(DashboardStats {
            events_by_status,
            registrations,
            member_count,
        })
    }
}
