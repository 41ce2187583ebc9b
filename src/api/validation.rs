use regex::Regex;
use std::sync::LazyLock;

use super::ApiError;
use super::types::MovieRequest;
use crate::constants::{accounts, ratings};
use crate::models::movie::NewMovie;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

/// Non-empty trimmed value of a required field.
pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing_fields(format!("{field} is required")))
}

pub fn validate_username(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.chars().count() < accounts::MIN_USERNAME_LEN {
        return Err(ApiError::validation(
            "INVALID_USERNAME",
            format!(
                "Username must be at least {} characters",
                accounts::MIN_USERNAME_LEN
            ),
        ));
    }
    Ok(name)
}

pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(ApiError::validation(
            "INVALID_EMAIL",
            "Please enter a valid email address",
        ));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    let len = password.chars().count();
    if !(accounts::MIN_PASSWORD_LEN..=accounts::MAX_PASSWORD_LEN).contains(&len) {
        return Err(ApiError::validation(
            "INVALID_PASSWORD",
            format!(
                "Password must be between {} and {} characters",
                accounts::MIN_PASSWORD_LEN,
                accounts::MAX_PASSWORD_LEN
            ),
        ));
    }
    Ok(password)
}

/// TMDB ids arrive as strings or numbers.
fn tmdb_id(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_list(list: Option<&Vec<String>>) -> Option<Vec<String>> {
    let items: Vec<String> = list?
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Checks an admin movie submission and converts it into a [`NewMovie`].
pub fn validate_movie(req: &MovieRequest) -> Result<NewMovie, ApiError> {
    let text = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    let (
        Some(tmdb_id),
        Some(title),
        Some(description),
        Some(video_url),
        Some(poster_path),
        Some(genre),
        Some(kind),
    ) = (
        tmdb_id(req.tmdb_id.as_ref()),
        text(&req.title),
        text(&req.description),
        text(&req.video_url),
        text(&req.poster_path),
        non_empty_list(req.genre.as_ref()),
        non_empty_list(req.kind.as_ref()),
    )
    else {
        return Err(ApiError::missing_fields(
            "Missing required fields. Title, description, videoUrl, posterPath, genre, type, and tmdbId are required.",
        ));
    };

    let rating = req.rating.unwrap_or(ratings::MIN);
    if !rating.is_finite() || !(ratings::MIN..=ratings::MAX).contains(&rating) {
        return Err(ApiError::validation(
            "INVALID_RATING",
            format!("Rating must be between {} and {}", ratings::MIN, ratings::MAX),
        ));
    }

    let release_date = text(&req.release_date).unwrap_or_default();
    if !release_date.is_empty()
        && chrono::NaiveDate::parse_from_str(&release_date, "%Y-%m-%d").is_err()
    {
        return Err(ApiError::validation(
            "INVALID_RELEASE_DATE",
            "releaseDate must be formatted as YYYY-MM-DD",
        ));
    }

    Ok(NewMovie {
        backdrop_path: text(&req.backdrop_path).unwrap_or_else(|| poster_path.clone()),
        tmdb_id,
        title,
        description,
        video_url,
        poster_path,
        genre,
        kind,
        rating,
        release_date,
        tags: non_empty_list(req.tags.as_ref()).unwrap_or_default(),
    })
}
