//! Domain service for favorites and watch history.

use crate::library::FavoriteChange;
use crate::models::movie::Movie;
use crate::services::account_service::AccountError;

#[async_trait::async_trait]
pub trait LibraryService: Send + Sync {
    /// Adds or removes a favorite. Returns the change and the new favorite
    /// id list.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::MovieNotFound`] if the movie does not exist.
    async fn toggle_favorite(
        &self,
        user_id: i32,
        movie_id: &str,
    ) -> Result<(FavoriteChange, Vec<String>), AccountError>;

    /// Favorite movies in the order they were added.
    async fn favorites(&self, user_id: i32) -> Result<Vec<Movie>, AccountError>;

    /// Records a view, moving the movie to the front of the history.
    async fn record_watch(&self, user_id: i32, movie_id: &str) -> Result<(), AccountError>;

    /// History movies, most recent first. Removed movies are skipped.
    async fn history(&self, user_id: i32) -> Result<Vec<Movie>, AccountError>;

    async fn clear_history(&self, user_id: i32) -> Result<(), AccountError>;
}
