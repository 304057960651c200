//! HTTP-level tests: the real route table against in-memory stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::{Method, StatusCode},
    test,
};
use serde_json::{Value, json};
use uuid::Uuid;

use inkwell_core::ports::ViewRepository;
use inkwell_infra::{InMemoryLikeRepository, InMemoryPostRepository, InMemoryViewRepository};

use crate::app::build_app;
use crate::config::AppConfig;
use crate::state::{AppState, Repositories};

const KEY: &str = "test-admin-key-0001";

struct TestEnv {
    state: AppState,
    views: Arc<InMemoryViewRepository>,
}

fn env_with(pairs: &[(&str, &str)]) -> TestEnv {
    let mut vars: HashMap<String, String> = HashMap::from([(
        "ADMIN_API_KEYS".to_string(),
        format!("other-key, {KEY}"),
    )]);
    for (k, v) in pairs {
        vars.insert(k.to_string(), v.to_string());
    }
    let config = AppConfig::from_lookup(|key| vars.get(key).cloned());

    let views = Arc::new(InMemoryViewRepository::new());
    let repositories = Repositories {
        posts: Arc::new(InMemoryPostRepository::new()),
        likes: Arc::new(InMemoryLikeRepository::new()),
        views: views.clone(),
    };

    TestEnv {
        state: AppState::with_repositories(config, repositories),
        views,
    }
}

fn env() -> TestEnv {
    env_with(&[])
}

async fn body_json<B: MessageBody>(res: ServiceResponse<B>) -> (StatusCode, Value) {
    let status = res.status();
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn create(title: &str, published: bool) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("X-API-Key", KEY))
        .set_json(json!({ "title": title, "content": "hello", "published": published }))
}

macro_rules! send {
    ($app:expr, $req:expr) => {
        body_json(test::call_service(&$app, $req.to_request()).await).await
    };
}

/// Create a published post with a valid key and return its body.
macro_rules! create_post {
    ($app:expr, $title:expr) => {{
        let (status, body) = send!($app, create($title, true));
        assert_eq!(status, StatusCode::CREATED);
        body
    }};
}

#[actix_web::test]
async fn test_health() {
    let app = test::init_service(build_app(env().state)).await;

    let (status, body) = send!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_web::test]
async fn test_create_generates_slug_and_fetches_by_slug_or_id() {
    let app = test::init_service(build_app(env().state)).await;

    let created = create_post!(app, "Test Post");
    assert_eq!(created["slug"], "test-post");
    assert_eq!(created["likes"], 0);
    assert_eq!(created["views"], 0);

    let (status, by_slug) = send!(app, test::TestRequest::get().uri("/api/v1/posts/test-post"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["id"], created["id"]);

    let uri = format!("/api/v1/posts/{}", created["id"].as_str().unwrap());
    let (status, by_id) = send!(app, test::TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["title"], "Test Post");

    let (status, body) = send!(app, test::TestRequest::get().uri("/api/v1/posts/no-such-post"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_list_filters_by_published() {
    let app = test::init_service(build_app(env().state)).await;

    send!(app, create("Published One", true));
    send!(app, create("Draft One", false));

    let (status, body) = send!(app, test::TestRequest::get().uri("/api/v1/posts?published=true"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["posts"][0]["title"], "Published One");

    let (_, body) = send!(app, test::TestRequest::get().uri("/api/v1/posts?page=0&limit=500"));
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
}

#[actix_web::test]
async fn test_create_validation_and_conflicts() {
    let app = test::init_service(build_app(env().state)).await;

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(("X-API-Key", KEY))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"title\": ")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");

    let (status, body) = send!(app, create("   ", true));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");

    create_post!(app, "Same Title");
    let (status, body) = send!(app, create("Same Title", true));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Post with this slug already exists");
}

#[actix_web::test]
async fn test_admin_routes_require_key() {
    let app = test::init_service(build_app(env().state)).await;

    let (status, missing) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .set_json(json!({ "title": "x", "content": "y" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, invalid) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(("X-API-Key", "test-admin-key-0002"))
            .set_json(json!({ "title": "x", "content": "y" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing, invalid);

    let uri = format!("/api/v1/posts/{}", Uuid::new_v4());
    let (status, _) = send!(app, test::TestRequest::delete().uri(&uri));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_empty_key_set_fails_closed() {
    let app = test::init_service(build_app(env_with(&[("ADMIN_API_KEYS", "")]).state)).await;

    let (status, body) = send!(app, create("Anything", true));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "SERVER_MISCONFIGURATION");
}

#[actix_web::test]
async fn test_update_and_delete() {
    let app = test::init_service(build_app(env().state)).await;

    let created = create_post!(app, "Original");
    let uri = format!("/api/v1/posts/{}", created["id"].as_str().unwrap());

    let (status, updated) = send!(
        app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(("X-API-Key", KEY))
            .set_json(json!({ "title": "Renamed", "content": "new body", "tags": ["rust"] }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], "renamed");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_eq!(updated["tags"], json!(["rust"]));

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri("/api/v1/posts/not-a-uuid")
            .insert_header(("X-API-Key", KEY))
            .set_json(json!({ "title": "x", "content": "y" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = send!(
        app,
        test::TestRequest::delete().uri(&uri).insert_header(("X-API-Key", KEY))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post deleted successfully");

    let (status, _) = send!(
        app,
        test::TestRequest::delete().uri(&uri).insert_header(("X-API-Key", KEY))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_duplicate_like_rejected_by_default() {
    let app = test::init_service(build_app(env().state)).await;

    let created = create_post!(app, "Likeable");
    let uri = format!("/api/v1/posts/{}/like", created["id"].as_str().unwrap());

    let (status, body) = send!(app, test::TestRequest::put().uri(&uri));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 1);
    assert_eq!(body["message"], "Post liked successfully");

    let (status, body) = send!(app, test::TestRequest::post().uri(&uri));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Post already liked");
}

#[actix_web::test]
async fn test_duplicate_like_is_noop_when_idempotent() {
    let app = test::init_service(build_app(env_with(&[("LIKE_POLICY", "idempotent")]).state)).await;

    let created = create_post!(app, "Likeable");
    let uri = format!("/api/v1/posts/{}/like", created["id"].as_str().unwrap());

    send!(app, test::TestRequest::put().uri(&uri));
    let (status, body) = send!(app, test::TestRequest::put().uri(&uri));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 1);
    assert_eq!(body["message"], "Post already liked");
}

#[actix_web::test]
async fn test_like_then_dislike_restores_counter() {
    let app = test::init_service(build_app(env().state)).await;

    let created = create_post!(app, "Round Trip");
    let id = created["id"].as_str().unwrap().to_string();
    let like = format!("/api/v1/posts/{id}/like");
    let dislike = format!("/api/v1/posts/{id}/dislike");

    // Dislike at zero stays at zero
    let (status, body) = send!(app, test::TestRequest::put().uri(&dislike));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 0);

    send!(app, test::TestRequest::put().uri(&like));
    let (status, body) = send!(app, test::TestRequest::put().uri(&dislike));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 0);
    assert_eq!(body["message"], "Post disliked successfully");

    // The like record is gone, so liking again is allowed
    let (status, body) = send!(app, test::TestRequest::put().uri(&like));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 1);
}

#[actix_web::test]
async fn test_view_is_recorded_in_background() {
    let env = env();
    let views = env.views.clone();
    let app = test::init_service(build_app(env.state)).await;

    let created = create_post!(app, "Viewed");
    let id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();
    let uri = format!("/api/v1/posts/{id}/view");

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri(&uri).insert_header(("User-Agent", "test-agent"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["views"], 1);

    let mut recorded = 0;
    for _ in 0..100 {
        recorded = views.count_by_post(id).await.unwrap();
        if recorded == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(recorded, 1);

    let (_, post) = send!(app, test::TestRequest::get().uri(&format!("/api/v1/posts/{id}")));
    assert_eq!(post["views"], 1);
}

#[actix_web::test]
async fn test_view_of_missing_post_records_nothing() {
    let env = env();
    let views = env.views.clone();
    let app = test::init_service(build_app(env.state)).await;

    let missing = Uuid::new_v4();
    let (status, body) = send!(
        app,
        test::TestRequest::put().uri(&format!("/api/v1/posts/{missing}/view"))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(views.count_by_post(missing).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_sanitizer_rejects_operator_in_query() {
    let app = test::init_service(build_app(env().state)).await;

    let (status, body) = send!(app, test::TestRequest::get().uri("/api/v1/posts?published=$where"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, _) = send!(app, test::TestRequest::get().uri("/api/v1/posts?published=true"));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_admin_rate_limit() {
    let app = test::init_service(build_app(
        env_with(&[("ADMIN_RATE_LIMIT_PER_MINUTE", "2")]).state,
    ))
    .await;

    send!(app, create("One", true));
    send!(app, create("Two", true));
    let res = test::call_service(&app, create("Three", true).to_request()).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key("Retry-After"));

    // Public routes use their own limiter
    let (status, body) = send!(app, test::TestRequest::get().uri("/api/v1/posts"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
}

#[actix_web::test]
async fn test_public_rate_limit_is_opt_in() {
    let app = test::init_service(build_app(
        env_with(&[
            ("PUBLIC_RATE_LIMIT_ENABLED", "true"),
            ("PUBLIC_SOCIAL_RATE_LIMIT_PER_MINUTE", "1"),
        ])
        .state,
    ))
    .await;

    let created = create_post!(app, "Popular");
    let uri = format!("/api/v1/posts/{}/view", created["id"].as_str().unwrap());

    let (status, _) = send!(app, test::TestRequest::put().uri(&uri));
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send!(app, test::TestRequest::put().uri(&uri));
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");

    // Browsing is a separate tier
    let (status, _) = send!(app, test::TestRequest::get().uri("/api/v1/posts"));
    assert_eq!(status, StatusCode::OK);

    let disabled = test::init_service(build_app(
        env_with(&[("PUBLIC_SOCIAL_RATE_LIMIT_PER_MINUTE", "0")]).state,
    ))
    .await;
    let created = create_post!(disabled, "Quiet");
    let uri = format!("/api/v1/posts/{}/view", created["id"].as_str().unwrap());
    let (status, _) = send!(disabled, test::TestRequest::put().uri(&uri));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_preflight_and_request_id() {
    let app = test::init_service(build_app(
        env_with(&[("ALLOWED_ORIGINS", "https://blog.example")]).state,
    ))
    .await;

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/api/v1/posts")
        .insert_header(("Origin", "https://blog.example"))
        .insert_header(("X-Request-ID", "req-42"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        res.headers().get("Access-Control-Allow-Origin").unwrap(),
        "https://blog.example"
    );
    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-42");
}
