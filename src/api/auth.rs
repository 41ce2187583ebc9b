use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::types::{
    AuthResponse, ChangePasswordRequest, GoogleTokenRequest, LoginRequest, SignupRequest, UserDto,
};
use super::validation::{required, validate_email, validate_password, validate_username};
use super::{ApiError, ApiJson, ApiResponse, AppState};
use crate::auth::TokenError;
use crate::domain::Role;
use crate::services::Session;

/// The authenticated caller, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <jwt>` and loads the user it names.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("MISSING_TOKEN", "No token provided"))?;

    let user_id = state.shared.tokens.user_id(token).map_err(|e| match e {
        TokenError::Expired => ApiError::unauthorized("TOKEN_EXPIRED", "Token has expired"),
        TokenError::NotYetValid => {
            ApiError::unauthorized("TOKEN_NOT_ACTIVE", "Token is not active yet")
        }
        TokenError::Invalid => ApiError::unauthorized("INVALID_TOKEN", "Invalid token"),
        TokenError::Internal(msg) => ApiError::internal(msg),
    })?;

    let user = state
        .store()
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("USER_NOT_FOUND", "User not found"))?;

    tracing::Span::current().record("user_id", user.id);

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });

    Ok(next.run(request).await)
}

/// Must run after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|user| user.role.is_admin());

    if !is_admin {
        return Err(ApiError::forbidden("ADMIN_ONLY", "Access denied. Admin only."));
    }

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

fn auth_response(session: Session, message: &str) -> AuthResponse {
    AuthResponse {
        success: true,
        token: session.token,
        user: UserDto::from(session.user),
        message: message.to_string(),
    }
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        payload.name.as_deref().filter(|v| !v.trim().is_empty()),
        payload.email.as_deref().filter(|v| !v.trim().is_empty()),
        payload.password.as_deref().filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::missing_fields("Name, email and password are required"));
    };

    let name = validate_username(name)?;
    let email = validate_email(email)?;
    let password = validate_password(password)?;

    let session = state
        .shared
        .account_service
        .signup(name, &email, password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(auth_response(session, "User created successfully")),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = required(payload.email.as_deref(), "email")?;
    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::missing_fields("password is required"))?;

    let session = state.shared.account_service.login(email, password).await?;
    Ok(Json(auth_response(session, "Logged in successfully")))
}

/// POST /auth/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Logged out successfully"))
}

/// POST /auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let new_password = payload
        .new_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::missing_fields("newPassword is required"))?;
    let new_password = validate_password(new_password)?;

    state
        .shared
        .account_service
        .change_password(user.id, payload.current_password.as_deref(), new_password)
        .await?;

    Ok(Json(ApiResponse::message("Password updated successfully")))
}

/// POST /auth/google/token and /auth/google/verify
pub async fn google_token(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<GoogleTokenRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let token = required(payload.token.as_deref(), "token")?;
    let session = state.shared.account_service.google_login(token).await?;
    Ok(Json(auth_response(session, "Google authentication successful")))
}
