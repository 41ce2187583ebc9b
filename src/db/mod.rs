use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::catalog::CatalogQuery;
use crate::config::SecurityConfig;
use crate::domain::Role;
use crate::models::comment::{Comment, NewComment, NewReview, Review};
use crate::models::movie::{Movie, NewMovie};
use crate::models::user::{NewUser, User};

pub mod migrator;
pub mod repositories;

pub use repositories::movie::MovieSlice;

/// Write failures that callers need to tell apart.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the offending column.
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Classifies an insert/update failure, turning unique violations into
    /// [`StoreError::Duplicate`].
    #[must_use]
    pub fn from_insert(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                Self::Duplicate(violated_column(&message))
            }
            _ => Self::Db(err),
        }
    }
}

/// Extracts the column from messages like
/// `UNIQUE constraint failed: users.email`.
fn violated_column(message: &str) -> String {
    message
        .rsplit(['.', ' '])
        .next()
        .map(|c| c.trim_matches(|ch: char| !ch.is_alphanumeric() && ch != '_'))
        .filter(|c| !c.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every in-memory connection is its own database
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn movie_repo(&self) -> repositories::movie::MovieRepository {
        repositories::movie::MovieRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn engagement_repo(&self) -> repositories::engagement::EngagementRepository {
        repositories::engagement::EngagementRepository::new(self.conn.clone())
    }

    pub async fn find_movies(&self, query: &CatalogQuery) -> Result<MovieSlice> {
        self.movie_repo().find(query).await
    }

    pub async fn get_movie(&self, tmdb_id: &str) -> Result<Option<Movie>> {
        self.movie_repo().get(tmdb_id).await
    }

    pub async fn get_movies_by_tmdb_ids(&self, ids: &[String]) -> Result<Vec<Movie>> {
        self.movie_repo().get_by_tmdb_ids(ids).await
    }

    pub async fn insert_movie(&self, movie: &NewMovie) -> Result<Movie, StoreError> {
        self.movie_repo().insert(movie).await
    }

    pub async fn distinct_genres(&self) -> Result<Vec<String>> {
        self.movie_repo().distinct_genres().await
    }

    pub async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        self.engagement_repo().insert_comment(comment).await
    }

    pub async fn comments_for_movie(&self, video_id: &str) -> Result<Vec<Comment>> {
        self.engagement_repo().comments_for_movie(video_id).await
    }

    pub async fn count_comments(&self, video_id: &str) -> Result<u64> {
        self.engagement_repo().count_comments(video_id).await
    }

    pub async fn insert_review(&self, review: &NewReview) -> Result<Review, StoreError> {
        self.engagement_repo().insert_review(review).await
    }

    pub async fn reviews_for_movie(&self, video_id: &str) -> Result<Vec<Review>> {
        self.engagement_repo().reviews_for_movie(video_id).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_google_id(&self, google_id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_google_id(google_id).await
    }

    pub async fn get_user_by_customer_id(&self, customer_id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_customer_id(customer_id).await
    }

    pub async fn create_user(
        &self,
        user: &NewUser,
        security: &SecurityConfig,
    ) -> Result<User, StoreError> {
        self.user_repo().create(user, security).await
    }

    pub async fn save_user(&self, user: &User) -> Result<User, StoreError> {
        self.user_repo().save(user).await
    }

    pub async fn verify_user_password(&self, user_id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(user_id, password).await
    }

    pub async fn set_user_password(
        &self,
        user_id: i32,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .set_password(user_id, password, security)
            .await
    }

    pub async fn set_user_role(&self, email: &str, role: Role) -> Result<bool> {
        self.user_repo().set_role(email, role).await
    }
}
