use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub tmdb_id: String,
    pub title: String,
    pub description: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub video_url: String,
    pub genre: Vec<String>,
    pub kind: Vec<String>,
    pub rating: f64,
    pub release_date: String,
    pub tags: Vec<String>,
}

/// A movie that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMovie {
    pub tmdb_id: String,
    pub title: String,
    pub description: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub video_url: String,
    pub genre: Vec<String>,
    pub kind: Vec<String>,
    pub rating: f64,
    pub release_date: String,
    pub tags: Vec<String>,
}

impl Movie {
    #[must_use]
    pub fn has_genre(&self, genre: &str) -> bool {
        contains_tag(&self.genre, genre)
    }

    #[must_use]
    pub fn has_type(&self, kind: &str) -> bool {
        contains_tag(&self.kind, kind)
    }

    /// Backdrop to display, falling back to the poster when none was stored.
    #[must_use]
    pub fn display_backdrop(&self) -> &str {
        if self.backdrop_path.trim().is_empty() {
            &self.poster_path
        } else {
            &self.backdrop_path
        }
    }
}

/// Case-insensitive exact match against any element of a tag set.
#[must_use]
pub fn contains_tag(tags: &[String], wanted: &str) -> bool {
    let wanted = wanted.to_lowercase();
    tags.iter().any(|tag| tag.to_lowercase() == wanted)
}
