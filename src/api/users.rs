use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::types::{FavoritesDto, MovieDto, UpdateUsernameRequest, UserDto, movie_dtos};
use super::validation::required;
use super::{ApiError, ApiJson, ApiResponse, AppState};
use crate::library::FavoriteChange;

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let profile = state.shared.account_service.me(user.id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(profile))))
}

/// PUT /users/me/username
pub async fn update_username(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<UpdateUsernameRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let new_username = required(payload.new_username.as_deref(), "newUsername")
        .map_err(|_| ApiError::missing_fields("New username cannot be empty"))?;

    let updated = state
        .shared
        .account_service
        .update_username(user.id, new_username)
        .await?;

    Ok(Json(
        ApiResponse::success(UserDto::from(updated)).with_message("Username updated successfully"),
    ))
}

/// GET /users/favorites
pub async fn favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<MovieDto>>>, ApiError> {
    let movies = state.shared.library_service.favorites(user.id).await?;
    Ok(Json(ApiResponse::success(movie_dtos(movies))))
}

/// POST /users/favorites/{movie_id}
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(movie_id): Path<String>,
) -> Result<Json<ApiResponse<FavoritesDto>>, ApiError> {
    let (change, favorites) = state
        .shared
        .library_service
        .toggle_favorite(user.id, &movie_id)
        .await?;

    let message = match change {
        FavoriteChange::Added => "Added to favorites",
        FavoriteChange::Removed => "Removed from favorites",
    };

    Ok(Json(
        ApiResponse::success(FavoritesDto { favorites }).with_message(message),
    ))
}

/// GET /users/watch-history
pub async fn watch_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<MovieDto>>>, ApiError> {
    let movies = state.shared.library_service.history(user.id).await?;
    Ok(Json(ApiResponse::success(movie_dtos(movies))))
}

/// POST /users/watch-history/{movie_id}
pub async fn add_to_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(movie_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .shared
        .library_service
        .record_watch(user.id, &movie_id)
        .await?;
    Ok(Json(ApiResponse::message("Added to watch history")))
}

/// DELETE /users/watch-history
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.shared.library_service.clear_history(user.id).await?;
    Ok(Json(ApiResponse::message("Watch history cleared")))
}
