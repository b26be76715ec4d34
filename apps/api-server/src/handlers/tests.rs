use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test};
use serde_json::{Value, json};

use folio_core::domain::{NewCategory, NewPost, NewProject, NewSkill, NewUser};
use folio_core::ports::{AuthError, PasswordService, STAFF_ROLE, TokenKind, TokenService};
use folio_infra::{
    Argon2PasswordService, InMemoryRateLimiter, JwtConfig, JwtTokenService, RateLimitConfig,
};

use super::configure_app;
use crate::state::{AppState, Repositories};

struct TestApp {
    state: AppState,
    post_id: i64,
    staff_token: String,
    reader_token: String,
    staff_refresh: String,
}

async fn setup() -> TestApp {
    setup_with_limit(100).await
}

async fn setup_with_limit(max_requests: u32) -> TestApp {
    let repos = Repositories::in_memory();
    let passwords = Arc::new(Argon2PasswordService::new());

    let staff = repos
        .users
        .create(NewUser {
            username: "editor".to_string(),
            email: "editor@example.com".to_string(),
            password_hash: passwords.hash("editor-pass").unwrap(),
            is_staff: true,
        })
        .await
        .unwrap();
    let reader = repos
        .users
        .create(NewUser {
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: passwords.hash("reader-pass").unwrap(),
            is_staff: false,
        })
        .await
        .unwrap();

    let category = repos
        .categories
        .create(NewCategory::new("Rust", "rust"))
        .await
        .unwrap();
    let post = repos
        .posts
        .create(
            NewPost::new(staff.id, category.id, "Hello", "hello-world", "Body")
                .published()
                .with_tags(["rust", "web"]),
        )
        .await
        .unwrap();
    repos
        .posts
        .create(NewPost::new(staff.id, category.id, "Draft", "draft", "Not yet"))
        .await
        .unwrap();

    repos
        .portfolio
        .create_project(NewProject::new(
            "Folio Backend",
            "Blog and portfolio API",
            "Written in Rust.",
        ))
        .await
        .unwrap();
    repos
        .portfolio
        .create_skill(NewSkill::new("Rust", 90, 1))
        .await
        .unwrap();

    let tokens = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "handler-test-secret".to_string(),
        ..JwtConfig::default()
    }));
    let staff_roles = vec![STAFF_ROLE.to_string()];
    let staff_token = tokens
        .generate_token(TokenKind::Access, staff.id, "editor", staff_roles.clone())
        .unwrap();
    let staff_refresh = tokens
        .generate_token(TokenKind::Refresh, staff.id, "editor", staff_roles)
        .unwrap();
    let reader_token = tokens
        .generate_token(TokenKind::Access, reader.id, "reader", vec![])
        .unwrap();

    let limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_requests,
        window: Duration::from_secs(60),
    }));

    TestApp {
        state: AppState::from_parts(repos, tokens, passwords, limiter),
        post_id: post.id,
        staff_token,
        reader_token,
        staff_refresh,
    }
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn comment_body(post_id: i64, name: &str) -> Value {
    json!({
        "post": post_id,
        "name": name,
        "email": "visitor@example.com",
        "content": format!("Comment from {}", name),
    })
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect()
}

#[actix_web::test]
async fn test_submission_waits_for_approval_then_goes_public() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let mut created = Vec::new();
    for name in ["First", "Second"] {
        let req = test::TestRequest::post()
            .uri("/api/comments/add/")
            .set_json(comment_body(t.post_id, name))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["is_approved"], false);
        assert_eq!(body["author"], name);
        assert_eq!(body["post"]["slug"], "hello-world");
        assert_eq!(body["post"]["author"], "editor");
        assert!(body.get("email").is_none());
        created.push(body["id"].as_i64().unwrap());
    }
    let (c1, c2) = (created[0], created[1]);

    // Nothing public yet.
    let req = test::TestRequest::get().uri("/api/comments/").to_request();
    let public: Value = test::call_and_read_body_json(&app, req).await;
    assert!(public.as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri("/api/moderation/comments/pending/")
        .insert_header(bearer(&t.staff_token))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&pending), vec![c2, c1]);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/moderation/comments/{}/toggle-approve/", c1))
        .insert_header(bearer(&t.staff_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let toggled: Value = test::read_body_json(resp).await;
    assert_eq!(toggled["id"], c1);
    assert_eq!(toggled["is_approved"], true);
    assert_eq!(toggled["post"]["category"]["slug"], "rust");

    let req = test::TestRequest::get()
        .uri("/api/moderation/comments/pending/")
        .insert_header(bearer(&t.staff_token))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&pending), vec![c2]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/comments/?post={}", t.post_id))
        .to_request();
    let public: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&public), vec![c1]);
}

#[actix_web::test]
async fn test_toggle_twice_restores_pending() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(comment_body(t.post_id, "Ann"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/moderation/comments/{}/toggle-approve/", created["id"]);

    let mut flags = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(bearer(&t.staff_token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        flags.push(body["is_approved"].as_bool().unwrap());
    }

    assert_eq!(flags, vec![true, false]);
}

#[actix_web::test]
async fn test_non_staff_callers_are_forbidden_without_side_effects() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(comment_body(t.post_id, "Ann"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let toggle_uri = format!("/api/moderation/comments/{}/toggle-approve/", created["id"]);

    let reader = Some(bearer(&t.reader_token));
    let garbage = Some(bearer("not-a-jwt"));
    let refresh = Some(bearer(&t.staff_refresh));

    for auth in [None, reader, garbage, refresh] {
        let mut req = test::TestRequest::patch().uri(&toggle_uri);
        if let Some(h) = auth.clone() {
            req = req.insert_header(h);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let mut req = test::TestRequest::get().uri("/api/moderation/comments/pending/");
        if let Some(h) = auth.clone() {
            req = req.insert_header(h);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let mut req = test::TestRequest::post()
            .uri("/api/moderation/comments/approve/")
            .set_json(json!({ "ids": [created["id"]] }));
        if let Some(h) = auth {
            req = req.insert_header(h);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    // Still pending.
    let req = test::TestRequest::get()
        .uri("/api/moderation/comments/pending/")
        .insert_header(bearer(&t.staff_token))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending[0]["is_approved"], false);

    // Forbidden looks the same whether or not the comment exists.
    let req = test::TestRequest::patch()
        .uri("/api/moderation/comments/9999/toggle-approve/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_toggle_unknown_and_malformed_ids() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let req = test::TestRequest::patch()
        .uri("/api/moderation/comments/9999/toggle-approve/")
        .insert_header(bearer(&t.staff_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Comment not found");

    let req = test::TestRequest::patch()
        .uri("/api/moderation/comments/abc/toggle-approve/")
        .insert_header(bearer(&t.staff_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_malformed_moderation_requests_from_non_staff_are_forbidden() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    for auth in [None, Some(bearer(&t.reader_token))] {
        let mut req =
            test::TestRequest::patch().uri("/api/moderation/comments/abc/toggle-approve/");
        if let Some(h) = auth.clone() {
            req = req.insert_header(h);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let mut req = test::TestRequest::post()
            .uri("/api/moderation/comments/approve/")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json");
        if let Some(h) = auth {
            req = req.insert_header(h);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    let req = test::TestRequest::post()
        .uri("/api/moderation/comments/approve/")
        .insert_header(bearer(&t.staff_token))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_bulk_approve() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let mut created = Vec::new();
    for name in ["A", "B"] {
        let req = test::TestRequest::post()
            .uri("/api/comments/add/")
            .set_json(comment_body(t.post_id, name))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        created.push(body["id"].as_i64().unwrap());
    }

    let req = test::TestRequest::post()
        .uri("/api/moderation/comments/approve/")
        .insert_header(bearer(&t.staff_token))
        .set_json(json!({ "ids": created }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["approved"], 2);

    let req = test::TestRequest::get().uri("/api/comments/").to_request();
    let public: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&public), created);
}

#[actix_web::test]
async fn test_submit_comment_validation() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(json!({
            "post": t.post_id,
            "name": "Ann",
            "email": "ann@example.com",
            "body": "Sent as body"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["content"], "Sent as body");

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(json!({ "post": t.post_id, "name": "", "email": "nope", "content": "x" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(comment_body(9999, "Ann"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_comment_submission_is_rate_limited() {
    let t = setup_with_limit(1).await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(comment_body(t.post_id, "Ann"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .set_json(comment_body(t.post_id, "Ann"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));

    // Reads are not throttled.
    let req = test::TestRequest::get().uri("/api/comments/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_rotating_forwarded_for_shares_the_peer_bucket() {
    let t = setup_with_limit(1).await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;
    let peer: SocketAddr = "203.0.113.7:40000".parse().unwrap();

    let mut statuses = Vec::new();
    for i in 0..5 {
        let req = test::TestRequest::post()
            .uri("/api/comments/add/")
            .peer_addr(peer)
            .insert_header(("X-Forwarded-For", format!("10.0.0.{i}")))
            .set_json(comment_body(t.post_id, "Ann"))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(statuses[0], StatusCode::CREATED);
    assert!(statuses[1..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[actix_web::test]
async fn test_forwarded_for_is_honoured_behind_trusted_proxy() {
    let mut t = setup_with_limit(1).await;
    t.state.trust_proxy_headers = true;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;
    let proxy: SocketAddr = "192.0.2.1:8000".parse().unwrap();

    for client in ["10.0.0.1", "10.0.0.2"] {
        let req = test::TestRequest::post()
            .uri("/api/comments/add/")
            .peer_addr(proxy)
            .insert_header(("X-Forwarded-For", client))
            .set_json(comment_body(t.post_id, "Ann"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::post()
        .uri("/api/comments/add/")
        .peer_addr(proxy)
        .insert_header(("X-Forwarded-For", "10.0.0.1"))
        .set_json(comment_body(t.post_id, "Ann"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[derive(Default)]
struct CountingPasswords {
    inner: Argon2PasswordService,
    verifications: AtomicUsize,
}

impl PasswordService for CountingPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        self.inner.hash(password)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(password, hash)
    }
}

#[actix_web::test]
async fn test_unknown_username_still_verifies_a_hash() {
    let repos = Repositories::in_memory();
    let passwords = Arc::new(CountingPasswords::default());
    repos
        .users
        .create(NewUser {
            username: "editor".to_string(),
            email: "editor@example.com".to_string(),
            password_hash: passwords.hash("editor-pass").unwrap(),
            is_staff: true,
        })
        .await
        .unwrap();

    let tokens = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "handler-test-secret".to_string(),
        ..JwtConfig::default()
    }));
    let limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig::default()));
    let state = AppState::from_parts(repos, tokens, passwords.clone(), limiter);
    let app = test::init_service(App::new().configure(configure_app(state))).await;

    for (username, password) in [("ghost", "whatever"), ("editor", "wrong")] {
        let req = test::TestRequest::post()
            .uri("/api/token/")
            .set_json(json!({ "username": username, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(passwords.verifications.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn test_token_flow() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/token/")
        .set_json(json!({ "username": "editor", "password": "wrong" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/token/")
        .set_json(json!({ "username": "editor", "password": "editor-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let pair: Value = test::read_body_json(resp).await;
    let access = pair["access"].as_str().unwrap().to_string();
    let refresh = pair["refresh"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me/")
        .insert_header(bearer(&access))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "editor");
    assert_eq!(me["is_staff"], true);

    // A refresh token is not an access token, and vice versa.
    let req = test::TestRequest::get()
        .uri("/api/auth/me/")
        .insert_header(bearer(&refresh))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    let req = test::TestRequest::post()
        .uri("/api/token/refresh/")
        .set_json(json!({ "refresh": access }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/token/refresh/")
        .set_json(json!({ "refresh": refresh }))
        .to_request();
    let renewed: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/moderation/comments/pending/")
        .insert_header(bearer(renewed["access"].as_str().unwrap()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_public_blog_reads() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let req = test::TestRequest::get().uri("/api/categories/").to_request();
    let categories: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(categories[0]["slug"], "rust");

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let posts: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(posts.as_array().unwrap().len(), 1);
    assert_eq!(posts[0]["slug"], "hello-world");
    assert_eq!(posts[0]["tags"], json!(["rust", "web"]));

    let req = test::TestRequest::get()
        .uri("/api/posts/?category=Rust&search=hello&ordering=-updated_at")
        .to_request();
    let posts: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(posts.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/posts/?ordering=title")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::get().uri("/api/posts/hello-world/").to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(post["category"]["name"], "Rust");
    assert_eq!(post["published"], true);

    let req = test::TestRequest::get().uri("/api/posts/draft/").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_portfolio_and_health() {
    let t = setup().await;
    let app = test::init_service(App::new().configure(configure_app(t.state.clone()))).await;

    let req = test::TestRequest::get()
        .uri("/api/portfolio/projects/")
        .to_request();
    let projects: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(projects[0]["slug"], "folio-backend");

    let req = test::TestRequest::get()
        .uri("/api/portfolio/projects/folio-backend/")
        .to_request();
    let project: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(project["title"], "Folio Backend");
    assert!(project["github_url"].is_null());

    let req = test::TestRequest::get()
        .uri("/api/portfolio/projects/missing/")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri("/api/portfolio/skills/")
        .to_request();
    let skills: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(skills[0]["name"], "Rust");
    assert_eq!(skills[0]["proficiency"], 90);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let health: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["storage"], "memory");
}
