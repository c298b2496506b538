//! Cache invalidation bookkeeping
//!
//! A declarative mapping from each mutation to the cache key patterns it
//! makes stale. Eviction itself is fire-and-forget after the mutation
//! commits; a missed pattern here means stale reads, so the mapping is
//! tested explicitly.

use std::sync::Arc;

use tracing::warn;

use crate::services::cache::Cache;
use crate::utils::logging::log_cache_eviction;

/// Mutations that make cached reads stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    EventCreated { event_id: i64 },
    EventUpdated { event_id: i64 },
    EventDeleted { event_id: i64 },
    RegistrationChanged { event_id: i64 },
    GuestChanged { event_id: i64 },
    MerchandiseItemChanged { event_id: i64 },
    CheckoutCompleted { event_id: i64 },
    PaymentStatusChanged { event_id: i64 },
}

impl Mutation {
    /// Cache key patterns made stale by this mutation
    pub fn stale_patterns(&self) -> Vec<String> {
        match self {
            Mutation::EventCreated { event_id }
            | Mutation::EventUpdated { event_id }
            | Mutation::EventDeleted { event_id } => vec![
                format!("events:detail:{}", event_id),
                "events:list:*".to_string(),
                format!("events:{}:merchandise", event_id),
                "dashboard:*".to_string(),
            ],
            Mutation::RegistrationChanged { event_id }
            | Mutation::GuestChanged { event_id }
            | Mutation::PaymentStatusChanged { event_id } => vec![
                format!("events:detail:{}", event_id),
                "dashboard:*".to_string(),
            ],
            Mutation::MerchandiseItemChanged { event_id }
            | Mutation::CheckoutCompleted { event_id } => vec![
                format!("events:detail:{}", event_id),
                format!("events:{}:merchandise", event_id),
                "dashboard:*".to_string(),
            ],
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Mutation::EventCreated { .. } => "event_created",
            Mutation::EventUpdated { .. } => "event_updated",
            Mutation::EventDeleted { .. } => "event_deleted",
            Mutation::RegistrationChanged { .. } => "registration_changed",
            Mutation::GuestChanged { .. } => "guest_changed",
            Mutation::MerchandiseItemChanged { .. } => "merchandise_item_changed",
            Mutation::CheckoutCompleted { .. } => "checkout_completed",
            Mutation::PaymentStatusChanged { .. } => "payment_status_changed",
        }
    }
}

/// Evict everything the mutation made stale, off the request path.
///
/// Failures are logged and swallowed: eviction runs after the mutation
/// has already succeeded, so the response must not depend on it.
pub fn evict_after(cache: Arc<dyn Cache>, mutation: Mutation) {
    tokio::spawn(async move {
        let patterns = mutation.stale_patterns();
        let mut deleted = 0u64;
        for pattern in &patterns {
            match cache.delete_pattern(pattern).await {
                Ok(count) => deleted += count,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Cache eviction failed");
                }
            }
        }
        log_cache_eviction(mutation.name(), patterns.len(), deleted);
    });
}
