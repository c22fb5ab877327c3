//! Integration tests for the blog backend.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use reqwest::Client;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::{Config, LogFormat};
use crate::{create_router, AppState};

const TEST_SECRET: &str = "test-token-secret";

fn test_config(auth_enabled: bool, seed_posts: bool) -> Config {
    Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        log_format: LogFormat::Pretty,
        auth_enabled,
        token_secret: auth_enabled.then(|| TEST_SECRET.to_string()),
        token_ttl_secs: None,
        seed_posts,
    }
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
}

impl TestFixture {
    /// Open variant with the two sample posts.
    async fn new() -> Self {
        Self::with_config(test_config(false, true)).await
    }

    /// Authenticated variant with the two sample posts.
    async fn with_auth() -> Self {
        Self::with_config(test_config(true, true)).await
    }

    async fn with_config(config: Config) -> Self {
        let app = create_router(AppState::from_config(config));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestFixture {
            client: Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn create_post(&self, title: &str, content: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/posts"))
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }

    /// Register and log in, returning the access token.
    async fn login_as(&self, username: &str, password: &str) -> String {
        let creds = json!({ "username": username, "password": password });

        let resp = self
            .client
            .post(self.url("/register"))
            .json(&creds)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);

        let resp = self
            .client
            .post(self.url("/login"))
            .json(&creds)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_list_seed_posts() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/posts").await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!([
            {"id": 1, "title": "First post", "content": "This is the first post."},
            {"id": 2, "title": "Second post", "content": "This is the second post."}
        ])
    );
}

#[tokio::test]
async fn test_post_crud() {
    let fixture = TestFixture::new().await;

    // Create post
    let created = fixture.create_post("Third post", "Body").await;
    assert_eq!(created["id"], 3);
    assert_eq!(created["title"], "Third post");

    // Update only the title
    let update_resp = fixture
        .client
        .put(fixture.url("/api/posts/3"))
        .json(&json!({ "title": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let updated: Value = update_resp.json().await.unwrap();
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["content"], "Body");

    // Delete post
    let delete_resp = fixture
        .client
        .delete(fixture.url("/api/posts/3"))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);
    let delete_body: Value = delete_resp.json().await.unwrap();
    assert_eq!(
        delete_body["message"],
        "Post with id 3 has been deleted successfully."
    );

    let (_, body) = fixture.get_json("/api/posts").await;
    assert_eq!(ids(&body), vec![1, 2]);
}

#[tokio::test]
async fn test_deleted_max_id_is_reused() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .delete(fixture.url("/api/posts/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let created = fixture.create_post("Again", "Reused id").await;
    assert_eq!(created["id"], 2);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/posts"))
        .json(&json!({ "title": "Only a title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Missing fields: content" }));

    let resp = fixture
        .client
        .post(fixture.url("/api/posts"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing fields: title, content");

    // Malformed body still gets a JSON error
    let resp = fixture
        .client
        .post(fixture.url("/api/posts"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    // Nothing was added
    let (_, body) = fixture.get_json("/api/posts").await;
    assert_eq!(ids(&body), vec![1, 2]);
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .delete(fixture.url("/api/posts/99"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Post not found" }));

    let resp = fixture
        .client
        .put(fixture.url("/api/posts/99"))
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .delete(fixture.url("/api/posts/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Store unchanged
    let (_, body) = fixture.get_json("/api/posts").await;
    assert_eq!(ids(&body), vec![1, 2]);
}

#[tokio::test]
async fn test_sorting() {
    let fixture = TestFixture::with_config(test_config(false, false)).await;
    fixture.create_post("b", "second").await;
    fixture.create_post("a", "first").await;

    let (status, body) = fixture
        .get_json("/api/posts?sort=title&direction=asc")
        .await;
    assert_eq!(status, 200);
    assert_eq!(titles(&body), vec!["a", "b"]);

    let (_, body) = fixture
        .get_json("/api/posts?sort=title&direction=desc")
        .await;
    assert_eq!(titles(&body), vec!["b", "a"]);

    let (_, body) = fixture
        .get_json("/api/posts?sort=content&direction=asc")
        .await;
    assert_eq!(titles(&body), vec!["a", "b"]);
}

#[tokio::test]
async fn test_invalid_sort_parameters() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/api/posts?sort=title&direction=bogus")
        .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Invalid sort direction. Must be 'asc' or 'desc'."
    );

    let (status, body) = fixture.get_json("/api/posts?sort=bogus").await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Invalid sort field. Must be 'title' or 'content'."
    );

    let (status, _) = fixture.get_json("/api/posts?sort=title").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_direction_without_sort_is_ignored() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/posts?direction=desc").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body), vec![1, 2]);

    let (status, _) = fixture.get_json("/api/posts?direction=bogus").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_pagination() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/posts?page=1&per_page=1").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body), vec![1]);

    let (_, body) = fixture.get_json("/api/posts?page=2&per_page=1").await;
    assert_eq!(ids(&body), vec![2]);

    let (status, body) = fixture.get_json("/api/posts?page=3&per_page=1").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));

    // Non-positive and non-numeric values degrade instead of failing
    let (status, body) = fixture.get_json("/api/posts?page=0").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));

    let (status, body) = fixture.get_json("/api/posts?page=abc&per_page=xyz").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body), vec![1, 2]);
}

#[tokio::test]
async fn test_pagination_out_of_range_integer() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/api/posts?page=99999999999999999999&per_page=1")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_repeated_query_keys_use_first_value() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/api/posts/search?title=first&title=second")
        .await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body), vec![1]);

    let (status, body) = fixture
        .get_json("/api/posts?page=2&per_page=1&page=1")
        .await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body), vec![2]);

    let (status, body) = fixture
        .get_json("/api/posts?sort=title&direction=desc&direction=bogus")
        .await;
    assert_eq!(status, 200);
    assert_eq!(titles(&body), vec!["Second post", "First post"]);
}

#[tokio::test]
async fn test_sort_then_paginate() {
    let fixture = TestFixture::new().await;

    let (_, body) = fixture
        .get_json("/api/posts?sort=title&direction=desc&page=1&per_page=1")
        .await;
    assert_eq!(titles(&body), vec!["Second post"]);
}

#[tokio::test]
async fn test_search() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/posts/search?title=first").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body), vec![1]);

    let (_, body) = fixture.get_json("/api/posts/search?content=POST").await;
    assert_eq!(ids(&body), vec![1, 2]);

    let (_, body) = fixture
        .get_json("/api/posts/search?title=second&content=first")
        .await;
    assert_eq!(body, json!([]));

    let (_, body) = fixture.get_json("/api/posts/search").await;
    assert_eq!(ids(&body), vec![1, 2]);
}

#[tokio::test]
async fn test_account_routes_absent_without_auth() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/login"))
        .json(&json!({ "username": "a", "password": "b" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/posts"))
        .header("origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_auth_missing_token() {
    let fixture = TestFixture::with_auth().await;

    let (status, body) = fixture.get_json("/api/posts").await;
    assert_eq!(status, 401);
    assert_eq!(body, json!({ "error": "Missing or invalid token" }));

    let resp = fixture
        .client
        .post(fixture.url("/api/posts"))
        .json(&json!({ "title": "t", "content": "c" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .put(fixture.url("/api/posts/1"))
        .json(&json!({ "title": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .delete(fixture.url("/api/posts/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let (status, _) = fixture.get_json("/api/posts/search?title=first").await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_auth_invalid_token() {
    let fixture = TestFixture::with_auth().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/posts"))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_auth_valid_token() {
    let fixture = TestFixture::with_auth().await;
    let token = fixture.login_as("alice", "wonderland").await;

    let resp = fixture
        .client
        .get(fixture.url("/api/posts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(ids(&body), vec![1, 2]);

    let resp = fixture
        .client
        .post(fixture.url("/api/posts"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Authed", "content": "Post" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = fixture
        .client
        .delete(fixture.url("/api/posts/3"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_register_duplicate_and_missing_fields() {
    let fixture = TestFixture::with_auth().await;
    let creds = json!({ "username": "bob", "password": "builder" });

    let resp = fixture
        .client
        .post(fixture.url("/register"))
        .json(&creds)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = fixture
        .client
        .post(fixture.url("/register"))
        .json(&creds)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Username already exists");

    let resp = fixture
        .client
        .post(fixture.url("/register"))
        .json(&json!({ "username": "carol" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Username and password are required");

    let resp = fixture
        .client
        .post(fixture.url("/login"))
        .json(&json!({ "password": "builder" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_login_failures_are_generic() {
    let fixture = TestFixture::with_auth().await;
    fixture.login_as("dave", "correct").await;

    let resp = fixture
        .client
        .post(fixture.url("/login"))
        .json(&json!({ "username": "dave", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let wrong_password: Value = resp.json().await.unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/login"))
        .json(&json!({ "username": "nobody", "password": "correct" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let unknown_user: Value = resp.json().await.unwrap();

    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_health_not_gated_by_auth() {
    let fixture = TestFixture::with_auth().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_router_rejects_before_store_access() {
    let state = AppState::from_config(test_config(true, true));
    let posts = state.posts.clone();
    let app = create_router(state);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/posts/1")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The gate ran first, so the post is still there.
    assert_eq!(posts.list().await.len(), 2);
}

#[tokio::test]
async fn test_router_create_returns_created() {
    let state = AppState::from_config(test_config(false, false));
    let app = create_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/posts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title":"t","content":"c"}"#))
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "id": 1, "title": "t", "content": "c" }));
}
