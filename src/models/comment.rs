use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display identity embedded in comments and reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Store-assigned row id, used only to keep ordering stable.
    pub seq: i32,
    pub id: String,
    pub video_id: String,
    pub body: String,
    pub rating: f64,
    pub parent_id: Option<String>,
    pub user: Author,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub video_id: String,
    pub user_id: i32,
    pub body: String,
    pub rating: f64,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub seq: i32,
    pub id: String,
    pub video_id: String,
    pub body: String,
    pub rating: f64,
    pub user: Author,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub video_id: String,
    pub user_id: i32,
    pub body: String,
    pub rating: f64,
}
