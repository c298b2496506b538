//! Authentication middleware
//!
//! Bearer-token verification for the API surface. Token issuance belongs
//! to the association's identity tooling; this layer only verifies HS256
//! tokens and attaches the caller to the request.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::response::ApiError;
use crate::api::AppState;
use crate::config::settings::AuthConfig;
use crate::models::user::UserRole;
use crate::utils::errors::{AlumnetError, Result};

/// JWT claims carried by member tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub iss: String,
    pub exp: i64,
}

/// The authenticated caller, attached as a request extension
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Verify a bearer token and resolve the caller
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<CurrentUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AlumnetError::Authentication(format!("Invalid token: {}", e)))?;

    let role = UserRole::parse(&data.claims.role)
        .ok_or_else(|| AlumnetError::Authentication("Unknown role in token".to_string()))?;

    Ok(CurrentUser {
        id: data.claims.sub,
        email: data.claims.email,
        role,
    })
}

/// Issue a signed token. Used by operational tooling and the test suite;
/// the production login flow lives outside this service.
pub fn issue_token(
    user_id: i64,
    email: &str,
    role: UserRole,
    config: &AuthConfig,
    ttl_seconds: i64,
) -> Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role: role.as_str().to_string(),
        iss: config.issuer.clone(),
        exp: chrono::Utc::now().timestamp() + ttl_seconds,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AlumnetError::Authentication(format!("Failed to sign token: {}", e)))
}

/// Require a valid bearer token and attach [`CurrentUser`]
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            ApiError::from(AlumnetError::Authentication(
                "Missing bearer token".to_string(),
            ))
        })?;

    let user = verify_token(token, &state.settings.auth).map_err(|e| {
        warn!(error = %e, "Rejected request with invalid token");
        ApiError::from(e)
    })?;

    debug!(user_id = user.id, "Authenticated request");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Require the admin role on an already-authenticated request
pub async fn require_admin(
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| {
            ApiError::from(AlumnetError::Authentication(
                "Missing bearer token".to_string(),
            ))
        })?;

    if !user.is_admin() {
        warn!(user_id = user.id, "Unauthorized admin access attempt");
        return Err(ApiError::from(AlumnetError::PermissionDenied(
            "Admin privileges required".to_string(),
        )));
    }

    Ok(next.run(request).await)
}
