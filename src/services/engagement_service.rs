//! Domain service for comments and reviews.

use thiserror::Error;

use crate::domain::Role;
use crate::engagement::ThreadedComment;
use crate::models::comment::{Comment, Review};

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("Only admins can reply to comments")]
    ForbiddenReply,

    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("Movie not found: {0}")]
    MovieNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for EngagementError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for EngagementError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<crate::db::StoreError> for EngagementError {
    fn from(err: crate::db::StoreError) -> Self {
        Self::Database(err.to_string())
    }
}

/// Who is writing.
#[derive(Debug, Clone, Copy)]
pub struct Author {
    pub user_id: i32,
    pub role: Role,
}

/// Comment or review body as submitted. Fields are optional so that the
/// service decides, in order, between authorization and validation errors.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub comment: Option<String>,
    pub rating: Option<f64>,
    pub parent_id: Option<String>,
}

#[async_trait::async_trait]
pub trait EngagementService: Send + Sync {
    /// Adds a comment, or a reply when `draft.parent_id` is set.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::ForbiddenReply`] for replies by non-admins
    /// before anything else is checked or written.
    async fn add_comment(
        &self,
        author: Author,
        video_id: &str,
        draft: Draft,
    ) -> Result<Comment, EngagementError>;

    /// Comments of a movie assembled into reply threads.
    async fn comment_threads(&self, video_id: &str)
    -> Result<Vec<ThreadedComment>, EngagementError>;

    async fn add_review(
        &self,
        author: Author,
        video_id: &str,
        draft: Draft,
    ) -> Result<Review, EngagementError>;

    async fn reviews(&self, video_id: &str) -> Result<Vec<Review>, EngagementError>;
}
