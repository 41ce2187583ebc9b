use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::StoreError;
use crate::entities::{comments, reviews, users};
use crate::models::comment::{Author, Comment, NewComment, NewReview, Review};

pub struct EngagementRepository {
    conn: DatabaseConnection,
}

impl EngagementRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn author(user: Option<users::Model>, user_id: i32) -> Author {
        Author {
            id: user_id,
            name: user.map(|u| u.username).unwrap_or_default(),
        }
    }

    fn map_comment(model: comments::Model, user: Option<users::Model>) -> Comment {
        Comment {
            seq: model.id,
            user: Self::author(user, model.user_id),
            created_at: parse_timestamp(&model.created_at),
            id: model.public_id,
            video_id: model.video_id,
            body: model.body,
            rating: model.rating,
            parent_id: model.parent_id,
        }
    }

    fn map_review(model: reviews::Model, user: Option<users::Model>) -> Review {
        Review {
            seq: model.id,
            user: Self::author(user, model.user_id),
            created_at: parse_timestamp(&model.created_at),
            id: model.public_id,
            video_id: model.video_id,
            body: model.body,
            rating: model.rating,
        }
    }

    pub async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let active = comments::ActiveModel {
            public_id: Set(uuid::Uuid::new_v4().to_string()),
            video_id: Set(comment.video_id.clone()),
            user_id: Set(comment.user_id),
            body: Set(comment.body.clone()),
            rating: Set(comment.rating),
            parent_id: Set(comment.parent_id.clone()),
            created_at: Set(format_timestamp(Utc::now())),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(StoreError::from_insert)?;
        let user = users::Entity::find_by_id(model.user_id)
            .one(&self.conn)
            .await?;

        Ok(Self::map_comment(model, user))
    }

    /// All comments on a movie, oldest first, with their authors.
    pub async fn comments_for_movie(&self, video_id: &str) -> Result<Vec<Comment>> {
        let rows = comments::Entity::find()
            .filter(comments::Column::VideoId.eq(video_id))
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query comments")?;

        Ok(rows
            .into_iter()
            .map(|(comment, user)| Self::map_comment(comment, user))
            .collect())
    }

    pub async fn count_comments(&self, video_id: &str) -> Result<u64> {
        comments::Entity::find()
            .filter(comments::Column::VideoId.eq(video_id))
            .count(&self.conn)
            .await
            .context("Failed to count comments")
    }

    pub async fn insert_review(&self, review: &NewReview) -> Result<Review, StoreError> {
        let active = reviews::ActiveModel {
            public_id: Set(uuid::Uuid::new_v4().to_string()),
            video_id: Set(review.video_id.clone()),
            user_id: Set(review.user_id),
            body: Set(review.body.clone()),
            rating: Set(review.rating),
            created_at: Set(format_timestamp(Utc::now())),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(StoreError::from_insert)?;
        let user = users::Entity::find_by_id(model.user_id)
            .one(&self.conn)
            .await?;

        Ok(Self::map_review(model, user))
    }

    /// Reviews on a movie, oldest first.
    pub async fn reviews_for_movie(&self, video_id: &str) -> Result<Vec<Review>> {
        let rows = reviews::Entity::find()
            .filter(reviews::Column::VideoId.eq(video_id))
            .order_by_asc(reviews::Column::CreatedAt)
            .order_by_asc(reviews::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query reviews")?;

        Ok(rows
            .into_iter()
            .map(|(review, user)| Self::map_review(review, user))
            .collect())
    }
}

/// Fixed-width UTC timestamps so lexical order in SQL matches time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = DateTime::parse_from_rfc3339("2024-01-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = earlier + chrono::Duration::milliseconds(1500);

        let a = format_timestamp(earlier);
        let b = format_timestamp(later);
        assert!(a < b);
        assert_eq!(parse_timestamp(&a), earlier);
        assert_eq!(a, "2024-01-01T09:00:00.000000Z");
    }
}
