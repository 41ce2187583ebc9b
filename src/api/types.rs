use serde::{Deserialize, Serialize};

use crate::catalog::PageInfo;
use crate::models::comment::{Author, Comment, Review};
use crate::models::movie::Movie;
use crate::models::user::{SubscriptionRecord, User};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            data: Some(data),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            count: None,
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub backdrop_path: String,
    pub video_url: String,
    pub categories: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Vec<String>,
    pub rating: f64,
    pub release_date: String,
    pub tags: Vec<String>,
}

impl From<Movie> for MovieDto {
    fn from(movie: Movie) -> Self {
        Self {
            backdrop_path: movie.display_backdrop().to_string(),
            id: movie.tmdb_id,
            title: movie.title,
            description: movie.description,
            thumbnail_url: movie.poster_path,
            video_url: movie.video_url,
            categories: movie.genre,
            kind: movie.kind,
            rating: movie.rating,
            release_date: movie.release_date,
            tags: movie.tags,
        }
    }
}

pub fn movie_dtos(movies: Vec<Movie>) -> Vec<MovieDto> {
    movies.into_iter().map(MovieDto::from).collect()
}

/// `GET /movies`. Page fields are present only for paginated listings.
#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub success: bool,
    pub movies: Vec<MovieDto>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

#[derive(Debug, Serialize)]
pub struct GenresResponse {
    pub success: bool,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub favorites: Vec<String>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.username,
            email: user.email,
            role: user.role.to_string(),
            favorites: user.favorites,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserDto,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    pub video_id: String,
    pub comment: String,
    pub rating: f64,
    pub parent_id: Option<String>,
    pub user: Author,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<Comment> for CommentDto {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            video_id: c.video_id,
            comment: c.body,
            rating: c.rating,
            parent_id: c.parent_id,
            user: c.user,
            timestamp: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: String,
    pub video_id: String,
    pub comment: String,
    pub rating: f64,
    pub user: Author,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<Review> for ReviewDto {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            video_id: r.video_id,
            comment: r.body,
            rating: r.rating,
            user: r.user,
            timestamp: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FavoritesDto {
    pub favorites: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub id: String,
    pub status: String,
    pub plan_id: Option<String>,
    pub current_period_end: chrono::DateTime<chrono::Utc>,
}

impl From<SubscriptionRecord> for SubscriptionDto {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            id: record.subscription_id,
            status: record.status.to_string(),
            plan_id: record.plan_id,
            current_period_end: record.current_period_end,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub client_secret: Option<String>,
    pub subscription_id: String,
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub subscription: SubscriptionDto,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: String,
    pub subscription: Option<SubscriptionDto>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub received: bool,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleTokenRequest {
    #[serde(alias = "idToken", alias = "credential")]
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUsernameRequest {
    pub new_username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub comment: Option<String>,
    pub rating: Option<f64>,
    pub parent_id: Option<String>,
}

/// Body of `POST /movies/admin/movies` and entries of a movie import file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRequest {
    pub tmdb_id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genre: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub release_date: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub price_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSubscriptionRequest {
    pub subscription_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}
