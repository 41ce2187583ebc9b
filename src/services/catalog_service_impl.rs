//! `SeaORM` implementation of the `CatalogService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::catalog::query::{TagField, TagFilter};
use crate::catalog::{CatalogQuery, MovieListParams, QueryBuilder};
use crate::constants::catalog;
use crate::db::{Store, StoreError};
use crate::models::movie::{Movie, NewMovie};
use crate::services::catalog_service::{CatalogError, CatalogPage, CatalogService};

pub struct SeaOrmCatalogService {
    store: Store,
    builder: QueryBuilder,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub const fn new(store: Store, builder: QueryBuilder) -> Self {
        Self { store, builder }
    }
}

#[async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn list(&self, params: &MovieListParams) -> Result<CatalogPage, CatalogError> {
        let query = self.builder.build(params);
        let slice = self.store.find_movies(&query).await?;

        Ok(CatalogPage {
            page_info: query.pagination.map(|p| p.page_info(slice.total)),
            movies: slice.movies,
        })
    }

    async fn get(&self, tmdb_id: &str) -> Result<Movie, CatalogError> {
        self.store
            .get_movie(tmdb_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(tmdb_id.to_string()))
    }

    async fn by_type(&self, kind: &str) -> Result<Vec<Movie>, CatalogError> {
        let query = CatalogQuery {
            tag_filters: vec![TagFilter {
                field: TagField::Type,
                value: kind.to_string(),
            }],
            ..CatalogQuery::default()
        };

        Ok(self.store.find_movies(&query).await?.movies)
    }

    async fn add(&self, movie: NewMovie) -> Result<Movie, CatalogError> {
        match self.store.insert_movie(&movie).await {
            Ok(created) => {
                info!(tmdb_id = %created.tmdb_id, title = %created.title, "Added movie");
                Ok(created)
            }
            Err(StoreError::Duplicate(_)) => Err(CatalogError::AlreadyExists(movie.tmdb_id)),
            Err(StoreError::NotFound) => Err(CatalogError::Internal(
                "Inserted movie vanished".to_string(),
            )),
            Err(StoreError::Db(e)) => Err(e.into()),
            Err(StoreError::Other(e)) => Err(e.into()),
        }
    }

    async fn genres(&self) -> Result<Vec<String>, CatalogError> {
        let genres = self.store.distinct_genres().await?;
        Ok(genres
            .into_iter()
            .filter(|g| !g.trim().is_empty())
            .filter(|g| {
                !catalog::NON_GENRE_TAGS
                    .iter()
                    .any(|tag| tag.eq_ignore_ascii_case(g))
            })
            .collect())
    }
}
