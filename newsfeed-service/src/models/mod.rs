//! Data models for the newsfeed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of images a post may carry. Selections past the cap are
/// silently truncated, never rejected.
pub const MAX_POST_IMAGES: usize = 5;

/// A comment attached to a post.
///
/// Comments are append-only and live inside the post row as a JSONB array.
/// Ids are client-generated from the submission time, so rapid
/// double-submission can collide; that is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A user-authored feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub content: String,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i32,
    pub comments: Vec<Comment>,
}

/// Feed ordering selected by the sort toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Newest first (creation time descending).
    #[default]
    Latest,
    /// Highest like count first.
    MostLiked,
}

impl SortMode {
    /// Parse the `sort` query parameter; anything unrecognized falls back
    /// to latest-first.
    pub fn parse(value: &str) -> Self {
        match value {
            "likes" => SortMode::MostLiked,
            _ => SortMode::Latest,
        }
    }

    /// Value carried in the `sort` query parameter.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            SortMode::Latest => "latest",
            SortMode::MostLiked => "likes",
        }
    }
}

/// Local device identity; display-only, never enforced server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
