use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::types::{GenresResponse, MovieDto, MovieListResponse, MovieRequest, movie_dtos};
use super::validation::validate_movie;
use super::{ApiError, ApiJson, ApiResponse, AppState};
use crate::catalog::MovieListParams;

/// GET /movies
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MovieListParams>,
) -> Result<Json<MovieListResponse>, ApiError> {
    let page = state.shared.catalog_service.list(&params).await?;

    Ok(Json(MovieListResponse {
        success: true,
        movies: movie_dtos(page.movies),
        page: page.page_info,
    }))
}

/// GET /movies/{tmdb_id}
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(tmdb_id): Path<String>,
) -> Result<Json<ApiResponse<MovieDto>>, ApiError> {
    let movie = state.shared.catalog_service.get(&tmdb_id).await?;
    Ok(Json(ApiResponse::success(MovieDto::from(movie))))
}

/// GET /movies/by-type/{type}
pub async fn movies_by_type(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<Vec<MovieDto>>>, ApiError> {
    let movies = movie_dtos(state.shared.catalog_service.by_type(&kind).await?);
    let count = movies.len();
    Ok(Json(ApiResponse::success(movies).with_count(count)))
}

/// POST /movies/admin/movies
pub async fn add_movie(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<MovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = validate_movie(&payload)?;
    let created = state.shared.catalog_service.add(movie).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MovieDto::from(created)).with_message("Movie added successfully")),
    ))
}

/// GET /genres
pub async fn list_genres(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GenresResponse>, ApiError> {
    let genres = state.shared.catalog_service.genres().await?;
    Ok(Json(GenresResponse {
        success: true,
        genres,
    }))
}
