//! HTTP middleware
//!
//! Authentication and rate limiting layers for the API router.

pub mod auth;
pub mod rate_limit;

pub use auth::{require_admin, require_auth, CurrentUser};
pub use rate_limit::{RateLimitConfig, RateLimiter};
