//! `SeaORM` implementation of the `LibraryService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::db::Store;
use crate::library::{self, FavoriteChange};
use crate::models::movie::Movie;
use crate::models::user::User;
use crate::services::account_service::AccountError;
use crate::services::library_service::LibraryService;

pub struct SeaOrmLibraryService {
    store: Store,
}

impl SeaOrmLibraryService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn load(&self, user_id: i32) -> Result<User, AccountError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    async fn ensure_movie(&self, movie_id: &str) -> Result<(), AccountError> {
        if self.store.get_movie(movie_id).await?.is_none() {
            return Err(AccountError::MovieNotFound(movie_id.to_string()));
        }
        Ok(())
    }

    async fn movies_in_order(&self, ids: &[String]) -> Result<Vec<Movie>, AccountError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let movies = self.store.get_movies_by_tmdb_ids(ids).await?;
        Ok(library::order_by_ids(ids, movies))
    }
}

#[async_trait]
impl LibraryService for SeaOrmLibraryService {
    async fn toggle_favorite(
        &self,
        user_id: i32,
        movie_id: &str,
    ) -> Result<(FavoriteChange, Vec<String>), AccountError> {
        self.ensure_movie(movie_id).await?;
        let mut user = self.load(user_id).await?;

        let change = library::toggle_favorite(&mut user, movie_id);
        let user = self.store.save_user(&user).await?;

        debug!(user_id, movie_id, ?change, "Toggled favorite");
        Ok((change, user.favorites))
    }

    async fn favorites(&self, user_id: i32) -> Result<Vec<Movie>, AccountError> {
        let user = self.load(user_id).await?;
        self.movies_in_order(&user.favorites).await
    }

    async fn record_watch(&self, user_id: i32, movie_id: &str) -> Result<(), AccountError> {
        self.ensure_movie(movie_id).await?;
        let mut user = self.load(user_id).await?;

        library::record_watch(&mut user, movie_id, Utc::now());
        self.store.save_user(&user).await?;

        debug!(user_id, movie_id, "Recorded watch");
        Ok(())
    }

    async fn history(&self, user_id: i32) -> Result<Vec<Movie>, AccountError> {
        let user = self.load(user_id).await?;
        let ids: Vec<String> = user
            .watch_history
            .iter()
            .map(|entry| entry.video_id.clone())
            .collect();
        self.movies_in_order(&ids).await
    }

    async fn clear_history(&self, user_id: i32) -> Result<(), AccountError> {
        let mut user = self.load(user_id).await?;
        let cleared = user.watch_history.len();

        library::clear_history(&mut user);
        self.store.save_user(&user).await?;

        info!(user_id, cleared, "Cleared watch history");
        Ok(())
    }
}
