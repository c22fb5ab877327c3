//! Post model and the request bodies that create or change posts.

use serde::{Deserialize, Serialize};

/// A short text post with a store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
}

impl Post {
    pub fn new(id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Request body for creating a new post.
///
/// Both fields are optional at the type level so that a missing field
/// surfaces as a validation error naming it rather than as a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Request body for updating an existing post. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Query string of `GET /api/posts`.
///
/// Kept as raw text; the query engine decides what is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPostsQuery {
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl ListPostsQuery {
    /// Build from decoded query pairs. A repeated key keeps its first value.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            sort: first_value(pairs, "sort"),
            direction: first_value(pairs, "direction"),
            page: first_value(pairs, "page"),
            per_page: first_value(pairs, "per_page"),
        }
    }
}

/// Query string of `GET /api/posts/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPostsQuery {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl SearchPostsQuery {
    /// Build from decoded query pairs. A repeated key keeps its first value.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            title: first_value(pairs, "title"),
            content: first_value(pairs, "content"),
        }
    }
}

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

/// Confirmation body for operations that return no resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
