//! In-memory post store.
//!
//! The store is the only owner of the post list. Every operation takes the
//! lock once for its whole read-validate-mutate step, so concurrent requests
//! observe the same per-request atomicity as a single-threaded server.

use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{Post, UpdatePostRequest};

/// Authoritative collection of posts, in insertion order.
pub struct PostStore {
    posts: RwLock<Vec<Post>>,
}

impl PostStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_posts(Vec::new())
    }

    /// Create a store holding the two sample posts.
    pub fn seeded() -> Self {
        Self::with_posts(vec![
            Post::new(1, "First post", "This is the first post."),
            Post::new(2, "Second post", "This is the second post."),
        ])
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }

    /// Snapshot of all posts in insertion order.
    pub async fn list(&self) -> Vec<Post> {
        self.posts.read().await.clone()
    }

    /// Append a post with the next id.
    ///
    /// The id is one more than the largest current id, or 1 for an empty
    /// store, so deleting the newest post frees its id for reuse.
    pub async fn add(&self, title: Option<&str>, content: Option<&str>) -> Result<Post, AppError> {
        let title = title.filter(|t| !t.is_empty());
        let content = content.filter(|c| !c.is_empty());

        let (title, content) = match (title, content) {
            (Some(title), Some(content)) => (title, content),
            (title, content) => {
                let mut missing = Vec::new();
                if title.is_none() {
                    missing.push("title");
                }
                if content.is_none() {
                    missing.push("content");
                }
                return Err(AppError::Validation(format!(
                    "Missing fields: {}",
                    missing.join(", ")
                )));
            }
        };

        let mut posts = self.posts.write().await;
        let post = Post::new(next_id(&posts), title, content);
        posts.push(post.clone());

        tracing::info!(post_id = post.id, "Created post");
        Ok(post)
    }

    /// Remove the post with the given id.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut posts = self.posts.write().await;
        let index = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(AppError::post_not_found)?;
        posts.remove(index);

        tracing::info!(post_id = id, "Deleted post");
        Ok(())
    }

    /// Replace the supplied fields of a post, keeping the others.
    pub async fn update(&self, id: i64, request: &UpdatePostRequest) -> Result<Post, AppError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(AppError::post_not_found)?;

        if let Some(title) = &request.title {
            post.title = title.clone();
        }
        if let Some(content) = &request.content {
            post.content = content.clone();
        }

        tracing::info!(post_id = id, "Updated post");
        Ok(post.clone())
    }
}

impl Default for PostStore {
    fn default() -> Self {
        Self::new()
    }
}

fn next_id(posts: &[Post]) -> i64 {
    posts.iter().map(|p| p.id).max().map_or(1, |max| max + 1)
}
