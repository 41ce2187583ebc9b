//! `SeaORM` implementation of the `EngagementService` trait.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::constants::ratings;
use crate::db::Store;
use crate::engagement::{ThreadedComment, assemble, count_all};
use crate::models::comment::{Comment, NewComment, NewReview, Review};
use crate::services::engagement_service::{Author, Draft, EngagementError, EngagementService};

pub struct SeaOrmEngagementService {
    store: Store,
}

impl SeaOrmEngagementService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn ensure_movie(&self, video_id: &str) -> Result<(), EngagementError> {
        if self.store.get_movie(video_id).await?.is_none() {
            return Err(EngagementError::MovieNotFound(video_id.to_string()));
        }
        Ok(())
    }
}

/// Returns the trimmed body and the rating, or the validation error.
fn validate_draft(draft: &Draft) -> Result<(String, f64), EngagementError> {
    let body = draft
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let (Some(body), Some(rating)) = (body, draft.rating) else {
        return Err(EngagementError::Validation {
            code: "MISSING_FIELDS",
            message: "Comment and rating are required".to_string(),
        });
    };

    if !rating.is_finite() || !(ratings::MIN..=ratings::MAX).contains(&rating) {
        return Err(EngagementError::Validation {
            code: "INVALID_RATING",
            message: format!(
                "Rating must be between {} and {}",
                ratings::MIN,
                ratings::MAX
            ),
        });
    }

    Ok((body.to_string(), rating))
}

fn normalized_parent(draft: &Draft) -> Option<String> {
    draft
        .parent_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl EngagementService for SeaOrmEngagementService {
    async fn add_comment(
        &self,
        author: Author,
        video_id: &str,
        draft: Draft,
    ) -> Result<Comment, EngagementError> {
        let parent_id = normalized_parent(&draft);
        if parent_id.is_some() && !author.role.is_admin() {
            debug!(user_id = author.user_id, video_id, "Rejected reply from non-admin");
            return Err(EngagementError::ForbiddenReply);
        }

        let (body, rating) = validate_draft(&draft)?;
        self.ensure_movie(video_id).await?;

        let comment = self
            .store
            .insert_comment(&NewComment {
                video_id: video_id.to_string(),
                user_id: author.user_id,
                body,
                rating,
                parent_id,
            })
            .await?;

        info!(comment_id = %comment.id, video_id, reply = comment.parent_id.is_some(), "Added comment");
        Ok(comment)
    }

    async fn comment_threads(
        &self,
        video_id: &str,
    ) -> Result<Vec<ThreadedComment>, EngagementError> {
        let comments = self.store.comments_for_movie(video_id).await?;
        let threads = assemble(comments);
        debug!(
            video_id,
            threads = threads.len(),
            comments = count_all(&threads),
            "Assembled comment threads"
        );
        Ok(threads)
    }

    async fn add_review(
        &self,
        author: Author,
        video_id: &str,
        draft: Draft,
    ) -> Result<Review, EngagementError> {
        let (body, rating) = validate_draft(&draft)?;
        self.ensure_movie(video_id).await?;

        let review = self
            .store
            .insert_review(&NewReview {
                video_id: video_id.to_string(),
                user_id: author.user_id,
                body,
                rating,
            })
            .await?;

        info!(review_id = %review.id, video_id, "Added review");
        Ok(review)
    }

    async fn reviews(&self, video_id: &str) -> Result<Vec<Review>, EngagementError> {
        Ok(self.store.reviews_for_movie(video_id).await?)
    }
}
