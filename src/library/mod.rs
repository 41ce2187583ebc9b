//! Per-user favorites and watch history.
//!
//! These operate on the loaded [`User`]; persisting the result is up to the
//! caller.

use chrono::{DateTime, Utc};

use crate::models::movie::Movie;
use crate::models::user::{User, WatchEntry};

/// Whether a toggle added or removed the movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    Added,
    Removed,
}

/// Adds the movie to favorites, or removes it if already present.
pub fn toggle_favorite(user: &mut User, movie_id: &str) -> FavoriteChange {
    if let Some(pos) = user.favorites.iter().position(|id| id == movie_id) {
        user.favorites.remove(pos);
        FavoriteChange::Removed
    } else {
        user.favorites.push(movie_id.to_string());
        FavoriteChange::Added
    }
}

/// Moves (or inserts) the movie to the front of the history, stamped `now`.
pub fn record_watch(user: &mut User, movie_id: &str, now: DateTime<Utc>) {
    user.watch_history.retain(|entry| entry.video_id != movie_id);
    user.watch_history.insert(
        0,
        WatchEntry {
            video_id: movie_id.to_string(),
            watched_at: now,
        },
    );
}

pub fn clear_history(user: &mut User) {
    user.watch_history.clear();
}

/// Orders `movies` to follow `ids`, dropping ids without a movie.
#[must_use]
pub fn order_by_ids(ids: &[String], movies: Vec<Movie>) -> Vec<Movie> {
    let mut by_id: std::collections::HashMap<String, Movie> = movies
        .into_iter()
        .map(|m| (m.tmdb_id.clone(), m))
        .collect();

    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
