//! Post API endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Extensions, StatusCode},
    Json,
};

use super::ApiResult;
use crate::auth::AuthenticatedUser;
use crate::errors::AppError;
use crate::models::{
    CreatePostRequest, ListPostsQuery, MessageResponse, Post, SearchPostsQuery, UpdatePostRequest,
};
use crate::query::{self, ListOptions};
use crate::AppState;

/// GET /api/posts - List posts, optionally sorted, one page at a time.
pub async fn list_posts(
    State(state): State<AppState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Vec<Post>>> {
    let Query(pairs) = params.map_err(invalid_query)?;
    let params = ListPostsQuery::from_pairs(&pairs);
    let options = ListOptions::from_query(&params)?;

    let snapshot = state.posts.list().await;
    Ok(Json(query::list(snapshot, &options)))
}

/// POST /api/posts - Create a new post.
pub async fn create_post(
    State(state): State<AppState>,
    extensions: Extensions,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let Json(request) = body?;

    let post = state
        .posts
        .add(request.title.as_deref(), request.content.as_deref())
        .await?;

    if let Some(username) = AuthenticatedUser::from_extensions(&extensions) {
        tracing::debug!(post_id = post.id, username, "Post created by user");
    }

    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/posts/{id} - Update a post's title and/or content.
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> ApiResult<Json<Post>> {
    let id = parse_post_id(&id)?;
    let Json(request) = body?;

    let post = state.posts.update(id, &request).await?;
    Ok(Json(post))
}

/// DELETE /api/posts/{id} - Delete a post.
pub async fn delete_post(
    State(state): State<AppState>,
    extensions: Extensions,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_post_id(&id)?;

    state.posts.delete(id).await?;

    if let Some(username) = AuthenticatedUser::from_extensions(&extensions) {
        tracing::debug!(post_id = id, username, "Post deleted by user");
    }

    Ok(Json(MessageResponse::new(format!(
        "Post with id {} has been deleted successfully.",
        id
    ))))
}

/// GET /api/posts/search - Filter posts by title and/or content.
pub async fn search_posts(
    State(state): State<AppState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Vec<Post>>> {
    let Query(pairs) = params.map_err(invalid_query)?;
    let params = SearchPostsQuery::from_pairs(&pairs);

    let snapshot = state.posts.list().await;
    Ok(Json(query::search(snapshot, &params)))
}

/// Path ids are unsigned integers; anything else names no post.
fn parse_post_id(raw: &str) -> Result<i64, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::post_not_found());
    }
    raw.parse::<i64>().map_err(|_| AppError::post_not_found())
}

fn invalid_query(rejection: QueryRejection) -> AppError {
    AppError::InvalidParameter(format!("Invalid query string: {}", rejection.body_text()))
}
