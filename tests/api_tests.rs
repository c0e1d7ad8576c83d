use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use bookmark_service::{
    AppConfig, AppState, InMemoryRepository, create_router,
    models::{BookmarkMutationResponse, BookmarkResponse, User},
    repository::{Repository, RepositoryState},
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tower::util::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    repo: RepositoryState,
}

impl TestApp {
    async fn spawn() -> Self {
        let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
        let state = AppState {
            repo: repo.clone(),
            config: AppConfig::default(),
        };
        TestApp {
            router: create_router(state),
            repo,
        }
    }

    async fn seed_user(&self, username: &str) -> User {
        self.repo.create_user(username.to_string()).await.unwrap()
    }

    /// Sends one request; `as_user` uses the local `x-user-id` bypass.
    async fn send(
        &self,
        method: Method,
        uri: &str,
        as_user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = as_user {
            builder = builder.header("x-user-id", user.id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create(&self, user: &User, content: &str) -> BookmarkResponse {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/bookmarks",
                Some(user),
                Some(json!({ "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: BookmarkMutationResponse = serde_json::from_value(body).unwrap();
        created.bookmark
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::spawn().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::spawn().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_bookmark_lifecycle() {
    let app = TestApp::spawn().await;
    let user = app.seed_user("u").await;

    // Create
    let (status, body) = app
        .send(
            Method::POST,
            "/api/bookmarks",
            Some(&user),
            Some(json!({ "content": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Your bookmark was created successfully.");
    assert_eq!(body["bookmark"]["content"], "hello");
    assert_eq!(body["bookmark"]["author"], "u");
    assert_eq!(body["bookmark"]["dateCreated"], body["bookmark"]["dateModified"]);
    let id = body["bookmark"]["_id"].as_str().unwrap().to_string();

    // Newest first in the listing
    let (status, list) = app.send(Method::GET, "/api/bookmarks", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["_id"], id.as_str());

    // Edit with empty content
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/bookmarks/{}", id),
            Some(&user),
            Some(json!({ "content": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Edit properly
    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/bookmarks/{}", id),
            Some(&user),
            Some(json!({ "content": "hello again" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bookmark"]["content"], "hello again");
    assert_eq!(body["bookmark"]["_id"], id.as_str());

    // Delete
    let (status, body) = app
        .send(Method::DELETE, &format!("/api/bookmarks/{}", id), Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Your bookmark was deleted successfully.");

    let (_, list) = app.send(Method::GET, "/api/bookmarks", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_requires_login() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/bookmarks",
            None,
            Some(json!({ "content": "hello" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You must be logged in to complete this action.");
}

#[tokio::test]
async fn test_create_rejects_oversized_content() {
    let app = TestApp::spawn().await;
    let user = app.seed_user("verbose").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/bookmarks",
            Some(&user),
            Some(json!({ "content": "y".repeat(141) })),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_update_rejects_oversized_content() {
    let app = TestApp::spawn().await;
    let user = app.seed_user("editor").await;
    let bookmark = app.create(&user, "short").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/bookmarks/{}", bookmark.id),
            Some(&user),
            Some(json!({ "content": "z".repeat(141) })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body["error"],
        "Bookmark content must be no more than 140 characters."
    );

    // Exactly at the limit is accepted.
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/bookmarks/{}", bookmark.id),
            Some(&user),
            Some(json!({ "content": "z".repeat(140) })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_listing_follows_latest_modification() {
    let app = TestApp::spawn().await;
    let user = app.seed_user("reorder").await;
    let older = app.create(&user, "older").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = app.create(&user, "newer").await;

    let (_, list) = app.send(Method::GET, "/api/bookmarks", None, None).await;
    assert_eq!(list[0]["_id"], newer.id.as_str());
    assert_eq!(list[1]["_id"], older.id.as_str());

    tokio::time::sleep(Duration::from_millis(5)).await;
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/bookmarks/{}", older.id),
            Some(&user),
            Some(json!({ "content": "older, edited" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Editing moves the older bookmark back to the top.
    let (_, list) = app.send(Method::GET, "/api/bookmarks", None, None).await;
    assert_eq!(list[0]["_id"], older.id.as_str());
    assert_eq!(list[0]["content"], "older, edited");
    assert_eq!(list[1]["_id"], newer.id.as_str());
}

#[tokio::test]
async fn test_malformed_bodies_are_json_bad_requests() {
    let app = TestApp::spawn().await;
    let user = app.seed_user("sloppy").await;

    let (status, body) = app
        .send(Method::POST, "/api/bookmarks", Some(&user), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/bookmarks",
            Some(&user),
            Some(json!({ "content": 42 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // No body and no content type at all.
    let (status, body) = app
        .send(Method::POST, "/api/bookmarks", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_body_is_checked_after_existence_and_ownership() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let intruder = app.seed_user("intruder").await;
    let bookmark = app.create(&owner, "mine").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/bookmarks/{}", bookmark.id),
            Some(&intruder),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot modify other users' bookmarks.");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/bookmarks/{}", Uuid::new_v4()),
            Some(&owner),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/bookmarks/{}", bookmark.id),
            Some(&owner),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_owner_cannot_modify() {
    let app = TestApp::spawn().await;
    let owner = app.seed_user("owner").await;
    let intruder = app.seed_user("intruder").await;
    let bookmark = app.create(&owner, "mine").await;
    let uri = format!("/api/bookmarks/{}", bookmark.id);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&intruder),
            Some(json!({ "content": "theirs now" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, list) = app.send(Method::GET, "/api/bookmarks", None, None).await;
    assert_eq!(list[0]["content"], "mine");
}

#[tokio::test]
async fn test_unknown_bookmark_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.seed_user("u").await;

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/bookmarks/{}", Uuid::new_v4()),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filter_by_author() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user("alice").await;
    let bob = app.seed_user("bob").await;
    app.create(&alice, "a1").await;
    app.create(&bob, "b1").await;
    app.create(&alice, "a2").await;

    let (status, list) = app
        .send(Method::GET, "/api/bookmarks?author=alice", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let list: Vec<BookmarkResponse> = serde_json::from_value(list).unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|b| b.author == "alice"));

    let (status, _) = app
        .send(Method::GET, "/api/bookmarks?author=carol", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::GET, "/api/bookmarks?author=", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_account_deletion_removes_only_that_users_bookmarks() {
    let app = TestApp::spawn().await;
    let leaving = app.seed_user("leaving").await;
    let staying = app.seed_user("staying").await;
    app.create(&leaving, "bye").await;
    app.create(&staying, "still here").await;

    let (status, _) = app
        .send(Method::DELETE, "/api/users", Some(&leaving), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = app.send(Method::GET, "/api/bookmarks", None, None).await;
    let list: Vec<BookmarkResponse> = serde_json::from_value(list).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].author, "staying");
}
