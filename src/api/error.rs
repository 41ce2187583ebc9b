use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::services::{AccountError, BillingError, CatalogError, EngagementError};

/// Error returned by handlers. Every variant carries a machine-readable code
/// that ends up in the `error` field of the body.
#[derive(Debug)]
pub enum ApiError {
    Validation { code: &'static str, message: String },

    Unauthorized { code: &'static str, message: String },

    Forbidden { code: &'static str, message: String },

    NotFound { code: &'static str, message: String },

    Conflict { code: &'static str, message: String },

    /// A third party failed. `detail` is only sent to clients outside
    /// production.
    ExternalApiError {
        service: String,
        message: String,
        detail: Option<String>,
    },

    DatabaseError(String),

    InternalError(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message, .. } => write!(f, "Validation error: {message}"),
            Self::Unauthorized { message, .. } => write!(f, "Unauthorized: {message}"),
            Self::Forbidden { message, .. } => write!(f, "Forbidden: {message}"),
            Self::NotFound { message, .. } => write!(f, "Not found: {message}"),
            Self::Conflict { message, .. } => write!(f, "Conflict: {message}"),
            Self::ExternalApiError {
                service, message, ..
            } => write!(f, "{service} error: {message}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            Self::Validation { code, message } => (StatusCode::BAD_REQUEST, code, message, None),
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message, None)
            }
            Self::Forbidden { code, message } => (StatusCode::FORBIDDEN, code, message, None),
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message, None),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, code, message, None),
            Self::ExternalApiError {
                service,
                message,
                detail,
            } => {
                tracing::warn!("{} API error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    "PAYMENT_PROVIDER_ERROR",
                    format!("{service} request failed"),
                    detail,
                )
            }
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            error: code,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn validation(code: &'static str, msg: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: msg.into(),
        }
    }

    pub fn missing_fields(msg: impl Into<String>) -> Self {
        Self::validation("MISSING_FIELDS", msg)
    }

    pub fn unauthorized(code: &'static str, msg: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: msg.into(),
        }
    }

    pub fn forbidden(code: &'static str, msg: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: msg.into(),
        }
    }

    pub fn conflict(code: &'static str, msg: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: msg.into(),
        }
    }

    pub fn movie_not_found() -> Self {
        Self::NotFound {
            code: "MOVIE_NOT_FOUND",
            message: "Movie not found".to_string(),
        }
    }

    pub fn user_not_found() -> Self {
        Self::NotFound {
            code: "USER_NOT_FOUND",
            message: "User not found".to_string(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Maps a billing failure, keeping processor details only when
    /// `expose_detail` is set.
    #[must_use]
    pub fn from_billing(err: BillingError, expose_detail: bool) -> Self {
        match err {
            BillingError::UserNotFound => Self::user_not_found(),
            BillingError::MissingField(field) => {
                Self::missing_fields(format!("{field} is required"))
            }
            BillingError::SubscriptionMismatch => Self::forbidden(
                "SUBSCRIPTION_MISMATCH",
                "Subscription does not belong to this account",
            ),
            BillingError::InvalidSignature(reason) => Self::Validation {
                code: "INVALID_SIGNATURE",
                message: format!("Webhook Error: {reason}"),
            },
            BillingError::Payment(e) => Self::ExternalApiError {
                service: "Stripe".to_string(),
                message: e.to_string(),
                detail: expose_detail.then(|| e.to_string()),
            },
            BillingError::Database(msg) => Self::DatabaseError(msg),
            BillingError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => Self::movie_not_found(),
            CatalogError::AlreadyExists(id) => Self::conflict(
                "MOVIE_ALREADY_EXISTS",
                format!("A movie with tmdbId {id} already exists"),
            ),
            CatalogError::Database(msg) => Self::DatabaseError(msg),
            CatalogError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<EngagementError> for ApiError {
    fn from(err: EngagementError) -> Self {
        match err {
            EngagementError::ForbiddenReply => {
                Self::forbidden("FORBIDDEN_REPLY", "Only admins can reply to comments")
            }
            EngagementError::Validation { code, message } => Self::Validation { code, message },
            EngagementError::MovieNotFound(_) => Self::movie_not_found(),
            EngagementError::Database(msg) => Self::DatabaseError(msg),
            EngagementError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        use crate::auth::TokenError;

        match err {
            AccountError::InvalidCredentials => {
                Self::unauthorized("INVALID_CREDENTIALS", "Invalid credentials")
            }
            AccountError::EmailTaken => {
                Self::conflict("EMAIL_ALREADY_EXISTS", "Email already exists")
            }
            AccountError::UsernameTaken => {
                Self::conflict("USERNAME_TAKEN", "Username already taken")
            }
            AccountError::EmailRegisteredWithPassword => Self::conflict(
                "EMAIL_REGISTERED_WITH_PASSWORD",
                "This email is registered with a password. Log in with your password instead",
            ),
            AccountError::Validation { code, message } => Self::Validation { code, message },
            AccountError::GoogleRejected(reason) => {
                Self::unauthorized("INVALID_GOOGLE_TOKEN", format!("Google sign-in failed: {reason}"))
            }
            AccountError::GoogleAccountConflict => Self::conflict(
                "GOOGLE_ACCOUNT_CONFLICT",
                "Google sign-in is already in progress for this account, please retry",
            ),
            AccountError::GoogleDisabled => Self::Validation {
                code: "GOOGLE_DISABLED",
                message: "Google sign-in is not configured".to_string(),
            },
            AccountError::UserNotFound => Self::user_not_found(),
            AccountError::MovieNotFound(_) => Self::movie_not_found(),
            AccountError::Token(TokenError::Internal(msg)) => Self::InternalError(msg),
            AccountError::Token(e) => Self::unauthorized("INVALID_TOKEN", e.to_string()),
            AccountError::Database(msg) => Self::DatabaseError(msg),
            AccountError::Internal(msg) => Self::InternalError(msg),
        }
    }
}
