//! Domain service for the movie catalog.

use thiserror::Error;

use crate::catalog::{MovieListParams, PageInfo};
use crate::models::movie::{Movie, NewMovie};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Movie not found: {0}")]
    NotFound(String),

    #[error("A movie with tmdbId {0} already exists")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a catalog listing. `page_info` is set only for paginated
/// listings.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub movies: Vec<Movie>,
    pub page_info: Option<PageInfo>,
}

#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Lists movies matching the query-string parameters of `GET /movies`.
    async fn list(&self, params: &MovieListParams) -> Result<CatalogPage, CatalogError>;

    /// Gets one movie by its TMDB id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no such movie is stored.
    async fn get(&self, tmdb_id: &str) -> Result<Movie, CatalogError>;

    /// All movies whose type set contains `kind`, unpaginated.
    async fn by_type(&self, kind: &str) -> Result<Vec<Movie>, CatalogError>;

    /// Inserts a new movie.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AlreadyExists`] if the TMDB id is taken; the
    /// stored movie is left untouched.
    async fn add(&self, movie: NewMovie) -> Result<Movie, CatalogError>;

    /// Distinct genres across the catalog, sorted, without home screen
    /// row labels.
    async fn genres(&self) -> Result<Vec<String>, CatalogError>;
}
