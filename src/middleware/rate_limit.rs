//! Rate limiting middleware
//!
//! Fixed-window, per-user limiter applied to the registration endpoint.
//! State lives in process memory; each instance enforces its own window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::api::response::ApiError;
use crate::api::AppState;
use crate::middleware::auth::CurrentUser;
use crate::utils::errors::{AlumnetError, Result};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window_duration: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_duration: Duration::from_secs(60),
        }
    }
}

/// Request timestamps tracked per user
#[derive(Debug, Clone, Default)]
struct RateLimitEntry {
    requests: Vec<Instant>,
}

impl RateLimitEntry {
    /// Drop requests that fell out of the window
    fn cleanup(&mut self, window_duration: Duration) {
        let cutoff = Instant::now() - window_duration;
        self.requests.retain(|&time| time > cutoff);
    }

    fn is_allowed(&mut self, config: &RateLimitConfig) -> bool {
        self.cleanup(config.window_duration);
        (self.requests.len() as u32) < config.max_requests
    }

    fn record_request(&mut self) {
        self.requests.push(Instant::now());
    }
}

/// Per-user fixed-window rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Arc<Mutex<HashMap<i64, RateLimitEntry>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record the request and reject it once the window is exhausted
    pub fn check(&self, user_id: i64) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(user_id).or_default();

        if entry.is_allowed(&self.config) {
            entry.record_request();
            debug!(user_id = user_id, "Rate limit check passed");
            Ok(())
        } else {
            warn!(user_id = user_id, "Rate limit exceeded");
            Err(AlumnetError::RateLimitExceeded)
        }
    }
}

/// Gate a route on the per-user limiter. Must run after [`super::auth::require_auth`].
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| {
            ApiError::from(AlumnetError::Authentication(
                "Missing bearer token".to_string(),
            ))
        })?;

    state.rate_limiter.check(user.id)?;

    Ok(next.run(request).await)
}
