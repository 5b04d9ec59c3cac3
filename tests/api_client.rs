//! Integration tests for the REST client against a mocked WordPress site.
//!
//! Each test starts its own wiremock server, so the login flow, request
//! shapes and error mapping are exercised over real HTTP.

use pressroom::aggregate::resolve_featured_images;
use pressroom::api::{
    index_categories, ApiError, AuthScheme, Backend, Category, ClientOptions, Credentials,
    MediaLookup, PostPayload, PostStatus, WpApi, WpClient,
};
use pressroom::forms::{submit, FormMode, PostDraft};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{
    body_json, body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLACEHOLDER: &str = "http://localhost/wp/wp-content/uploads/no-image.jpg";

fn credentials() -> Credentials {
    Credentials::new("admin", "secret")
}

fn client(server: &MockServer) -> WpClient {
    WpClient::new(&server.uri(), ClientOptions::default()).unwrap()
}

fn post_json(id: u64, featured_media: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": { "rendered": format!("Post {}", id), "raw": format!("Post {}", id) },
        "content": { "rendered": "<p>Body</p>", "raw": "Body" },
        "status": status,
        "categories": [3],
        "featured_media": featured_media,
        "link": format!("http://localhost/wp/?p={}", id),
        "modified": "2024-10-06T10:00:00"
    })
}

/// Mount the JWT endpoints and log in.
async fn jwt_login(server: &MockServer) -> WpApi {
    Mock::given(method("POST"))
        .and(path("/wp-json/jwt-auth/v1/token"))
        .and(body_json(json!({ "username": "admin", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-123",
            "user_email": "admin@example.com",
            "user_nicename": "admin",
            "user_display_name": "Site Admin"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/jwt-auth/v1/token/validate"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "jwt_auth_valid_token",
            "data": { "status": 200 }
        })))
        .mount(server)
        .await;

    client(server)
        .login(&credentials(), AuthScheme::Jwt)
        .await
        .unwrap()
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_jwt_login_acquires_and_validates_token() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    assert_eq!(api.session().user(), "Site Admin");
    assert_eq!(api.session().scheme(), AuthScheme::Jwt);

    // The token rides on every authenticated call
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "name": "News &amp; Notes" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let categories = api.list_categories().await.unwrap();
    assert_eq!(categories[0].name, "News &amp; Notes");
}

#[tokio::test]
async fn test_jwt_login_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/jwt-auth/v1/token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "[jwt_auth] incorrect_password",
            "message": "The password you entered is incorrect.",
            "data": { "status": 403 }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .login(&credentials(), AuthScheme::Jwt)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref m) if m.contains("incorrect")));
}

#[tokio::test]
async fn test_invalid_token_fails_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/jwt-auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-123" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/jwt-auth/v1/token/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "something_else" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .login(&credentials(), AuthScheme::Jwt)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
}

#[tokio::test]
async fn test_basic_login_sends_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "name": "Site Admin", "slug": "admin"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server)
        .login(&credentials(), AuthScheme::Basic)
        .await
        .unwrap();
    assert_eq!(api.session().scheme(), AuthScheme::Basic);
    assert_eq!(api.session().user(), "Site Admin");

    // Logging out hands back a client that can log in again
    let client = api.logout();
    assert!(client.api_root().as_str().ends_with("/wp-json/"));
}

// ============================================================================
// Posts
// ============================================================================

#[tokio::test]
async fn test_list_posts_query() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("status", "publish,draft,trash"))
        .and(query_param("context", "edit"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            post_json(1, 5, "publish"),
            post_json(2, 0, "draft"),
            post_json(3, 0, "inherit")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let posts = api.list_posts(&PostStatus::LISTED).await.unwrap();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].media_ref(), Some(5));
    assert_eq!(posts[1].status, PostStatus::Draft);
    assert_eq!(posts[2].status, PostStatus::Other);
    assert_eq!(posts[0].title_text(), "Post 1");
}

#[tokio::test]
async fn test_missing_post_maps_to_not_found() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "rest_post_invalid_id",
            "message": "Invalid post ID.",
            "data": { "status": 404 }
        })))
        .mount(&server)
        .await;

    let err = api.get_post(99).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == "Invalid post ID."));
}

#[tokio::test]
async fn test_error_body_maps_code_and_message() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "rest_invalid_param",
            "message": "Invalid parameter(s): status",
            "data": { "status": 400 }
        })))
        .mount(&server)
        .await;

    let payload = PostPayload {
        title: "Hello".into(),
        content: "Body".into(),
        categories: vec![3],
        status: PostStatus::Draft,
        featured_media: None,
    };
    match api.create_post(&payload).await.unwrap_err() {
        ApiError::Http {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 400);
            assert_eq!(code.as_deref(), Some("rest_invalid_param"));
            assert_eq!(message, "Invalid parameter(s): status");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_create_post_body() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(body_json(json!({
            "title": "Hello",
            "content": "Body",
            "categories": [3],
            "status": "draft"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(post_json(10, 0, "draft")))
        .expect(1)
        .mount(&server)
        .await;

    let payload = PostPayload {
        title: "Hello".into(),
        content: "Body".into(),
        categories: vec![3],
        status: PostStatus::Draft,
        featured_media: None,
    };
    let post = api.create_post(&payload).await.unwrap();
    assert_eq!(post.id, 10);
}

#[tokio::test]
async fn test_update_post_puts_to_post_url() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("PUT"))
        .and(path("/wp-json/wp/v2/posts/7"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "title": "Edited",
            "content": "New body",
            "categories": [4],
            "status": "publish"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(7, 0, "publish")))
        .expect(1)
        .mount(&server)
        .await;

    let payload = PostPayload {
        title: "Edited".into(),
        content: "New body".into(),
        categories: vec![4],
        status: PostStatus::Publish,
        featured_media: None,
    };
    let post = api.update_post(7, &payload).await.unwrap();
    assert_eq!(post.id, 7);
    assert_eq!(post.status, PostStatus::Publish);
}

#[tokio::test]
async fn test_list_categories_requests_full_page() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Uncategorized", "count": 0 },
            { "id": 3, "name": "News &amp; Notes", "count": 2 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let categories = api.list_categories().await.unwrap();
    assert_eq!(
        categories,
        vec![
            Category {
                id: 1,
                name: "Uncategorized".into()
            },
            Category {
                id: 3,
                name: "News &amp; Notes".into()
            },
        ]
    );
    let index = index_categories(categories);
    assert_eq!(index.get(&3).map(String::as_str), Some("News & Notes"));
}

#[tokio::test]
async fn test_delete_is_permanent() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/wp-json/wp/v2/posts/4"))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted": true,
            "previous": post_json(4, 0, "publish")
        })))
        .expect(1)
        .mount(&server)
        .await;

    api.delete_post(4).await.unwrap();
}

#[tokio::test]
async fn test_timeout_reported() {
    let server = MockServer::start().await;
    // Mount the login endpoints, then log in with a short timeout
    let _ = jwt_login(&server).await;
    let api = {
        WpClient::new(
            &server.uri(),
            ClientOptions {
                timeout: Duration::from_secs(1),
                ..ClientOptions::default()
            },
        )
        .unwrap()
        .login(&credentials(), AuthScheme::Jwt)
        .await
        .unwrap()
    };

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(post_json(1, 0, "publish"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = api.get_post(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(1)));
}

// ============================================================================
// Media
// ============================================================================

#[tokio::test]
async fn test_submit_uploads_image_then_creates_post() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/media"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("Featured Image of Post"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 77,
            "source_url": "http://localhost/wp/wp-content/uploads/cover.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(body_json(json!({
            "title": "With image",
            "content": "Body",
            "categories": [3],
            "status": "publish",
            "featured_media": 77
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(post_json(11, 77, "publish")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join("pressroom_api_client_test");
    std::fs::create_dir_all(&dir).unwrap();
    let image = dir.join("cover.png");
    std::fs::write(&image, b"\x89PNG\r\n\x1a\nfake").unwrap();

    let draft = PostDraft {
        title: "With image".into(),
        content: "Body".into(),
        category: 3,
        status: PostStatus::Publish,
        image: Some(image),
    };
    let post = submit(&api, FormMode::Create, &draft).await.unwrap();
    assert_eq!(post.id, 11);
    assert_eq!(post.media_ref(), Some(77));
}

#[tokio::test]
async fn test_featured_images_with_one_failing_lookup() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            post_json(1, 5, "publish"),
            post_json(2, 6, "publish"),
            post_json(3, 0, "draft")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/media/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "source_url": "http://localhost/wp/wp-content/uploads/a.jpg"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/media/6"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let posts = api.list_posts(&PostStatus::LISTED).await.unwrap();
    let images = resolve_featured_images(&api, &posts, PLACEHOLDER).await;

    assert_eq!(images.len(), 3);
    assert_eq!(images[&1], "http://localhost/wp/wp-content/uploads/a.jpg");
    assert_eq!(images[&2], PLACEHOLDER);
    assert_eq!(images[&3], PLACEHOLDER);
}

#[tokio::test]
async fn test_media_without_source_url_gets_placeholder() {
    let server = MockServer::start().await;
    let api = jwt_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            post_json(1, 5, "publish"),
            post_json(2, 8, "publish")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/media/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/media/8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = api.get_media(5).await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)), "got {:?}", err);
    assert_eq!(err.kind(), "malformed");

    let posts = api.list_posts(&PostStatus::LISTED).await.unwrap();
    let images = resolve_featured_images(&api, &posts, PLACEHOLDER).await;
    assert_eq!(images.len(), 2);
    assert_eq!(images[&1], PLACEHOLDER);
    assert_eq!(images[&2], PLACEHOLDER);
}
