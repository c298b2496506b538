//! JSON response envelope and error mapping
//!
//! Every success body is `{ "success": true, "data": …, "message": … }`;
//! every failure is `{ "success": false, "message": …, "errors": […] }`
//! with a conventional status code. Infrastructure errors surface as a
//! generic 500 message; details go to the log only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::utils::errors::AlumnetError;

/// Success envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        })
    }
}

/// Failure envelope carrying a status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "message": self.message,
            "errors": self.errors,
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<AlumnetError> for ApiError {
    fn from(err: AlumnetError) -> Self {
        match err {
            AlumnetError::InvalidInput(message)
            | AlumnetError::RegistrationNotOpen(message)
            | AlumnetError::ModificationClosed(message) => {
                Self::new(StatusCode::BAD_REQUEST, message)
            }
            AlumnetError::MissingRequiredFields { labels } => Self {
                status: StatusCode::BAD_REQUEST,
                message: "Required form fields are missing".to_string(),
                errors: Some(labels),
            },
            AlumnetError::InsufficientStock { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            AlumnetError::InvalidStateTransition { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            AlumnetError::DuplicateRegistration { .. } => {
                Self::new(StatusCode::CONFLICT, "You are already registered for this event")
            }
            AlumnetError::EventHasRegistrations { .. } => Self::new(
                StatusCode::CONFLICT,
                "The event has registrations and cannot be deleted",
            ),
            AlumnetError::Authentication(message) => Self::new(StatusCode::UNAUTHORIZED, message),
            AlumnetError::PermissionDenied(message) => Self::new(StatusCode::FORBIDDEN, message),
            AlumnetError::EventNotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Event not found"),
            AlumnetError::RegistrationNotFound { .. } | AlumnetError::RegistrationMissing { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Registration not found")
            }
            AlumnetError::GuestNotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Guest not found"),
            AlumnetError::MerchandiseItemNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Merchandise item not found")
            }
            AlumnetError::CartLineNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Cart line not found")
            }
            AlumnetError::UserNotFound { .. } => Self::new(StatusCode::NOT_FOUND, "User not found"),
            AlumnetError::RateLimitExceeded => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, try again later",
            ),
            AlumnetError::ServiceUnavailable(message) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
            }
            other => {
                error!(error = %other, severity = %other.severity(), "Unexpected error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred",
                )
            }
        }
    }
}

/// Result alias for API handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
