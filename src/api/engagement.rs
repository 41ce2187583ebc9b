use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::types::{CommentDto, CommentRequest, ReviewDto};
use super::{ApiError, ApiJson, ApiResponse, AppState};
use crate::engagement::ThreadedComment;
use crate::services::{Author, Draft};

fn author(user: &CurrentUser) -> Author {
    Author {
        user_id: user.id,
        role: user.role,
    }
}

/// POST /movies/{tmdb_id}/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(tmdb_id): Path<String>,
    ApiJson(payload): ApiJson<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = Draft {
        comment: payload.comment,
        rating: payload.rating,
        parent_id: payload.parent_id,
    };

    let comment = state
        .shared
        .engagement_service
        .add_comment(author(&user), &tmdb_id, draft)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CommentDto::from(comment))),
    ))
}

/// GET /movies/{tmdb_id}/comments
///
/// `count` is the number of top-level threads.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(tmdb_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ThreadedComment>>>, ApiError> {
    let threads = state
        .shared
        .engagement_service
        .comment_threads(&tmdb_id)
        .await?;

    let count = threads.len();
    Ok(Json(ApiResponse::success(threads).with_count(count)))
}

/// POST /movies/{tmdb_id}/reviews
pub async fn add_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(tmdb_id): Path<String>,
    ApiJson(payload): ApiJson<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = Draft {
        comment: payload.comment,
        rating: payload.rating,
        parent_id: None,
    };

    let review = state
        .shared
        .engagement_service
        .add_review(author(&user), &tmdb_id, draft)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ReviewDto::from(review))),
    ))
}

/// GET /movies/{tmdb_id}/reviews
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(tmdb_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ReviewDto>>>, ApiError> {
    let reviews: Vec<ReviewDto> = state
        .shared
        .engagement_service
        .reviews(&tmdb_id)
        .await?
        .into_iter()
        .map(ReviewDto::from)
        .collect();

    let count = reviews.len();
    Ok(Json(ApiResponse::success(reviews).with_count(count)))
}
