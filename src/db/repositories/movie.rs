use std::collections::BTreeSet;

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::debug;

use crate::catalog::{CatalogQuery, SortOrder};
use crate::db::StoreError;
use crate::entities::{movies, prelude::*};
use crate::models::movie::{Movie, NewMovie};

/// One page (or the whole result) of a catalog query.
#[derive(Debug, Clone)]
pub struct MovieSlice {
    pub movies: Vec<Movie>,
    /// Number of matching movies before pagination.
    pub total: u64,
}

pub struct MovieRepository {
    conn: DatabaseConnection,
}

impl MovieRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: movies::Model) -> Movie {
        Movie {
            id: model.id,
            tmdb_id: model.tmdb_id,
            title: model.title,
            description: model.description,
            poster_path: model.poster_path,
            backdrop_path: model.backdrop_path,
            video_url: model.video_url,
            genre: decode_tags(&model.genres),
            kind: decode_tags(&model.types),
            rating: model.rating,
            release_date: model.release_date,
            tags: decode_tags(&model.tags),
        }
    }

    fn sorted_select(sort: SortOrder) -> Select<Movies> {
        let select = Movies::find();
        match sort {
            SortOrder::Natural => select.order_by_asc(movies::Column::Id),
            SortOrder::ReleaseDateDesc => select
                .order_by_desc(movies::Column::ReleaseDate)
                .order_by_asc(movies::Column::Id),
        }
    }

    /// Runs a catalog query.
    ///
    /// Unfiltered listings are paged in SQL. Search and tag filters are
    /// applied to the sorted rows in Rust (tag sets are JSON columns and
    /// search needs Unicode case folding), then the filtered list is paged.
    pub async fn find(&self, query: &CatalogQuery) -> anyhow::Result<MovieSlice> {
        let select = Self::sorted_select(query.sort);

        if !query.filters_in_memory() {
            let total = select
                .clone()
                .count(&self.conn)
                .await
                .context("Failed to count movies")?;

            let select = match query.pagination {
                Some(p) if p.offset() >= total => {
                    return Ok(MovieSlice {
                        movies: Vec::new(),
                        total,
                    });
                }
                Some(p) => select.offset(p.offset()).limit(p.page_size),
                None => select,
            };

            let movies = select
                .all(&self.conn)
                .await
                .context("Failed to query movies")?
                .into_iter()
                .map(Self::map_model)
                .collect();

            return Ok(MovieSlice { movies, total });
        }

        let matching: Vec<Movie> = select
            .all(&self.conn)
            .await
            .context("Failed to query movies")?
            .into_iter()
            .map(Self::map_model)
            .filter(|m| query.matches(m))
            .collect();

        let total = matching.len() as u64;
        debug!(
            total,
            search = query.search.as_deref(),
            filters = query.tag_filters.len(),
            "Filtered catalog query"
        );

        let movies = match query.pagination {
            Some(p) => matching
                .into_iter()
                .skip(usize::try_from(p.offset()).unwrap_or(usize::MAX))
                .take(usize::try_from(p.page_size).unwrap_or(usize::MAX))
                .collect(),
            None => matching,
        };

        Ok(MovieSlice { movies, total })
    }

    pub async fn get(&self, tmdb_id: &str) -> anyhow::Result<Option<Movie>> {
        let movie = Movies::find()
            .filter(movies::Column::TmdbId.eq(tmdb_id))
            .one(&self.conn)
            .await
            .context("Failed to query movie by tmdb id")?;

        Ok(movie.map(Self::map_model))
    }

    /// Loads movies for the given ids. Unknown ids are skipped; the result is
    /// in store order, callers re-order as needed.
    pub async fn get_by_tmdb_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Movie>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Movies::find()
            .filter(movies::Column::TmdbId.is_in(ids.iter().cloned()))
            .order_by_asc(movies::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query movies by tmdb ids")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn insert(&self, movie: &NewMovie) -> Result<Movie, StoreError> {
        let txn = self.conn.begin().await?;

        let exists = Movies::find()
            .filter(movies::Column::TmdbId.eq(&movie.tmdb_id))
            .one(&txn)
            .await?
            .is_some();
        if exists {
            return Err(StoreError::Duplicate("tmdbId".to_string()));
        }

        let active = movies::ActiveModel {
            tmdb_id: Set(movie.tmdb_id.clone()),
            title: Set(movie.title.clone()),
            description: Set(movie.description.clone()),
            poster_path: Set(movie.poster_path.clone()),
            backdrop_path: Set(movie.backdrop_path.clone()),
            video_url: Set(movie.video_url.clone()),
            genres: Set(encode_tags(&movie.genre)),
            types: Set(encode_tags(&movie.kind)),
            tags: Set(encode_tags(&movie.tags)),
            rating: Set(movie.rating),
            release_date: Set(movie.release_date.clone()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active.insert(&txn).await.map_err(StoreError::from_insert)?;
        txn.commit().await?;

        Ok(Self::map_model(model))
    }

    /// All genres used by any movie, de-duplicated and sorted.
    pub async fn distinct_genres(&self) -> anyhow::Result<Vec<String>> {
        let rows: Vec<String> = Movies::find()
            .select_only()
            .column(movies::Column::Genres)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query movie genres")?;

        let genres: BTreeSet<String> = rows
            .iter()
            .flat_map(|raw| decode_tags(raw))
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();

        Ok(genres.into_iter().collect())
    }
}

fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

fn decode_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
