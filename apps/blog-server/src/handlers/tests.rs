use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use blog_core::BlogService;
use blog_core::domain::{Comment, Post, Tag};
use blog_infra::{InMemoryBlogStore, InMemoryMailer};

use super::configure_routes;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

struct Harness {
    state: AppState,
    mailer: Arc<InMemoryMailer>,
    posts: Vec<Post>,
}

/// Five published posts on consecutive days (newest first) and one draft.
async fn harness() -> Harness {
    let store = Arc::new(InMemoryBlogStore::new());
    let rust = Tag::new("Rust");
    let web_tag = Tag::new("Web");

    let mut posts = Vec::new();
    for i in 0..5u32 {
        let tags = match i {
            0 => vec![rust.clone(), web_tag.clone()],
            1 | 2 => vec![rust.clone()],
            _ => vec![web_tag.clone()],
        };
        let post = Post::new(
            Uuid::new_v4(),
            format!("Post {i}"),
            format!("Body of post {i} about ownership and borrowing."),
        )
        .published_at(Utc.with_ymd_and_hms(2024, 3, 20 - i, 8, 0, 0).unwrap())
        .with_tags(tags);
        store.insert_post(post.clone()).await;
        posts.push(post);
    }
    store
        .insert_post(Post::new(Uuid::new_v4(), "Secret".into(), "Draft".into()))
        .await;

    let mut hidden = Comment::new(posts[0].id, "Eve".into(), "eve@example.com".into(), "Spam".into());
    hidden.active = false;
    store.insert_comment(hidden).await;
    store
        .insert_comment(Comment::new(
            posts[0].id,
            "Ada".into(),
            "ada@example.com".into(),
            "Great read".into(),
        ))
        .await;

    let mailer = Arc::new(InMemoryMailer::new());
    let blog = BlogService::new(
        store.clone(),
        store.clone(),
        store,
        mailer.clone(),
        "blog@example.com",
    );

    Harness {
        state: AppState::from_parts(Arc::new(blog), None),
        mailer,
        posts,
    }
}

macro_rules! app {
    ($state:expr) => {{
        let state: AppState = $state;
        let limiter = state.rate_limiter.clone();
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new(state))
                .configure(move |cfg| configure_routes(cfg, limiter)),
        )
        .await
    }};
}

fn titles(page: &Value) -> Vec<String> {
    page["data"]["posts"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_owned())
        .collect()
}

#[actix_web::test]
async fn test_post_list_first_page() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/blog/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(titles(&body), vec!["Post 0", "Post 1", "Post 2"]);
    assert_eq!(body["data"]["posts"]["num_pages"], 2);
    assert_eq!(body["data"]["posts"]["has_next"], true);
    assert!(body["data"]["tag"].is_null());
}

#[actix_web::test]
async fn test_post_list_page_fallbacks() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/blog/?page=abc").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["posts"]["number"], 1);

    let req = test::TestRequest::get().uri("/blog/?page=9999").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["posts"]["number"], 2);
    assert_eq!(titles(&body), vec!["Post 3", "Post 4"]);
}

#[actix_web::test]
async fn test_post_list_by_tag() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/blog/tag/web/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["tag"]["slug"], "web");
    assert_eq!(titles(&body), vec!["Post 0", "Post 3", "Post 4"]);
}

#[actix_web::test]
async fn test_unknown_tag_is_problem_document() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/blog/tag/cobol/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["title"], "Not Found");
}

#[actix_web::test]
async fn test_post_detail() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get()
        .uri("/blog/2024/3/20/post-0/")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["post"]["title"], "Post 0");
    assert_eq!(body["data"]["post"]["url"], "/blog/2024/3/20/post-0/");

    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["name"], "Ada");
    assert!(comments[0].get("email").is_none());

    // Every other post shares exactly one tag, so publish date decides.
    let similar: Vec<&str> = body["data"]["similar_posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(similar, vec!["Post 1", "Post 2", "Post 3", "Post 4"]);
}

#[actix_web::test]
async fn test_post_detail_not_found() {
    let h = harness().await;
    let app = app!(h.state);

    for uri in [
        "/blog/2024/3/19/post-0/",
        "/blog/2024/13/1/post-0/",
        "/blog/2024/x/20/post-0/",
        "/blog/2024/3/20/secret/",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_comment_requires_post() {
    let h = harness().await;
    let post_id = h.posts[1].id;
    let app = app!(h.state);

    let req = test::TestRequest::get()
        .uri(&format!("/blog/{post_id}/comment/"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get(header::ALLOW).unwrap(), "POST");
}

#[actix_web::test]
async fn test_comment_submission() {
    let h = harness().await;
    let post_id = h.posts[1].id;
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{post_id}/comment/"))
        .set_form([("name", "Grace"), ("email", "grace@example.com"), ("body", "Thanks!")])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["message"], "Comment added");
    assert_eq!(body["data"]["comment"]["name"], "Grace");
    assert!(body["data"].get("errors").is_none());

    let req = test::TestRequest::get()
        .uri("/blog/2024/3/19/post-1/")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["comments"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_invalid_comment_returns_field_errors() {
    let h = harness().await;
    let post_id = h.posts[1].id;
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{post_id}/comment/"))
        .set_form([("name", "Grace"), ("email", "nope"), ("body", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["comment"].is_null());
    assert!(body["data"]["errors"]["email"].is_array());
    assert!(body["data"]["errors"]["body"].is_array());
}

#[actix_web::test]
async fn test_comment_on_missing_post_is_not_found() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/comment/", Uuid::new_v4()))
        .set_form([("name", "Grace"), ("email", "grace@example.com"), ("body", "Hi")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_share_get_shows_form_state() {
    let h = harness().await;
    let post_id = h.posts[0].id;
    let app = app!(h.state);

    let req = test::TestRequest::get()
        .uri(&format!("/blog/{post_id}/share/"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["sent"], false);
    assert_eq!(body["data"]["post"]["title"], "Post 0");
    assert!(h.mailer.outbox().await.is_empty());
}

#[actix_web::test]
async fn test_share_post_sends_email() {
    let h = harness().await;
    let post_id = h.posts[0].id;
    let mailer = h.mailer.clone();
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{post_id}/share/"))
        .insert_header((header::HOST, "blog.example.com"))
        .set_form([
            ("name", "Ada"),
            ("email", "ada@example.com"),
            ("to", "bob@example.com"),
            ("comment", "You will like this"),
        ])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["sent"], true);

    let outbox = mailer.outbox().await;
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].subject, "Ada recommends you read Post 0");
    assert!(
        outbox[0]
            .body
            .starts_with("Read Post 0 at http://blog.example.com/blog/2024/3/20/post-0/")
    );
    assert!(outbox[0].body.ends_with("Ada's comments: You will like this"));
}

#[actix_web::test]
async fn test_share_invalid_form_sends_nothing() {
    let h = harness().await;
    let post_id = h.posts[0].id;
    let mailer = h.mailer.clone();
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{post_id}/share/"))
        .set_form([("name", "Ada"), ("email", "ada@example.com"), ("to", "")])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["sent"], false);
    assert!(body["data"]["errors"]["to"].is_array());
    assert!(mailer.outbox().await.is_empty());
}

#[actix_web::test]
async fn test_share_mail_failure_is_bad_gateway() {
    let store = Arc::new(InMemoryBlogStore::new());
    let post = Post::new(Uuid::new_v4(), "Hello".into(), "World".into()).published_at(Utc::now());
    store.insert_post(post.clone()).await;
    let blog = BlogService::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(InMemoryMailer::failing("relay down")),
        "blog@example.com",
    );
    let app = app!(AppState::from_parts(Arc::new(blog), None));

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/share/", post.id))
        .set_form([("name", "Ada"), ("email", "ada@example.com"), ("to", "bob@example.com")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn test_search() {
    let store = Arc::new(InMemoryBlogStore::new());
    for (title, body) in [
        ("Lifetimes", "Lifetimes in depth. Lifetimes everywhere."),
        ("Traits", "A note on lifetimes."),
        ("Macros", "Nothing relevant."),
    ] {
        store
            .insert_post(Post::new(Uuid::new_v4(), title.into(), body.into()).published_at(Utc::now()))
            .await;
    }
    let blog = BlogService::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(InMemoryMailer::new()),
        "blog@example.com",
    );
    let app = app!(AppState::from_parts(Arc::new(blog), None));

    let req = test::TestRequest::get()
        .uri("/blog/search/?query=lifetimes")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["query"], "lifetimes");
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Lifetimes");
    assert!(results[0]["rank"].as_f64().unwrap() >= 0.3);

    let req = test::TestRequest::get().uri("/blog/search/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["query"].is_null());
    assert!(body["data"]["results"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_sitemap_lists_published_posts() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get()
        .uri("/sitemap.xml")
        .insert_header((header::HOST, "blog.example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let xml = std::str::from_utf8(&body).unwrap();
    assert_eq!(xml.matches("<url>").count(), 5);
    assert!(xml.contains("<loc>http://blog.example.com/blog/2024/3/20/post-0/</loc>"));
    assert!(!xml.contains("secret"));
}

#[actix_web::test]
async fn test_health_and_request_id() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("X-Request-ID", "abc-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_unknown_route_is_problem_document() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get().uri("/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().get("x-request-id").is_some());
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_comment_rate_limit() {
    use blog_core::ports::RateLimiter;
    use blog_infra::{InMemoryRateLimiter, RateLimitConfig};
    use std::time::Duration;

    let h = harness().await;
    let post_id = h.posts[1].id;
    let limiter: Arc<dyn RateLimiter> = Arc::new(
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
        })
        .unwrap(),
    );
    let app = app!(AppState::from_parts(h.state.blog.clone(), Some(limiter)));

    let submit = || {
        test::TestRequest::post()
            .uri(&format!("/blog/{post_id}/comment/"))
            .set_form([("name", "Grace"), ("email", "grace@example.com"), ("body", "Hi")])
            .to_request()
    };

    let first = test::call_service(&app, submit()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = test::call_service(&app, submit()).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().get(header::RETRY_AFTER).is_some());

    // Reads are never throttled.
    let req = test::TestRequest::get()
        .uri(&format!("/blog/{post_id}/share/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn test_rate_limit_keys_on_peer_address() {
    use blog_core::ports::RateLimiter;
    use blog_infra::{InMemoryRateLimiter, RateLimitConfig};
    use std::net::SocketAddr;
    use std::time::Duration;

    let h = harness().await;
    let post_id = h.posts[1].id;
    let limiter: Arc<dyn RateLimiter> = Arc::new(
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
        })
        .unwrap(),
    );
    let app = app!(AppState::from_parts(h.state.blog.clone(), Some(limiter)));

    let submit = |peer: &str, forwarded_for: &str| {
        test::TestRequest::post()
            .uri(&format!("/blog/{post_id}/comment/"))
            .peer_addr(peer.parse::<SocketAddr>().unwrap())
            .insert_header(("X-Forwarded-For", forwarded_for.to_owned()))
            .set_form([("name", "Grace"), ("email", "grace@example.com"), ("body", "Hi")])
            .to_request()
    };

    let first = test::call_service(&app, submit("203.0.113.7:40000", "198.51.100.1")).await;
    assert_eq!(first.status(), StatusCode::OK);

    // A fresh forwarding header from the same peer is still throttled.
    let spoofed = test::call_service(&app, submit("203.0.113.7:40001", "198.51.100.2")).await;
    assert_eq!(spoofed.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_peer = test::call_service(&app, submit("203.0.113.8:40000", "198.51.100.1")).await;
    assert_eq!(other_peer.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_large_comment_is_saved() {
    let h = harness().await;
    let post_id = h.posts[1].id;
    let app = app!(h.state);

    let long_body = "ownership ".repeat(2_500);
    let req = test::TestRequest::post()
        .uri(&format!("/blog/{post_id}/comment/"))
        .set_form([
            ("name", "Grace"),
            ("email", "grace@example.com"),
            ("body", long_body.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Comment added");
    assert_eq!(
        body["data"]["comment"]["body"].as_str().unwrap().len(),
        long_body.trim().len()
    );
}

#[actix_web::test]
async fn test_oversized_form_is_problem_document() {
    let h = harness().await;
    let post_id = h.posts[1].id;
    let app = app!(h.state);

    let huge = "x".repeat(super::FORM_LIMIT + 1);
    let req = test::TestRequest::post()
        .uri(&format!("/blog/{post_id}/share/"))
        .set_form([("name", "Ada"), ("comment", huge.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 413);
    assert!(h.mailer.outbox().await.is_empty());
}

#[actix_web::test]
async fn test_comment_without_form_body_is_problem_document() {
    let h = harness().await;
    let post_id = h.posts[1].id;
    let app = app!(h.state);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{post_id}/comment/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Unsupported Media Type");
}

#[actix_web::test]
async fn test_repeated_query_parameter_is_bad_request() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get()
        .uri("/blog/?page=1&page=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
}

#[actix_web::test]
async fn test_search_query_too_long_returns_field_errors() {
    let h = harness().await;
    let app = app!(h.state);

    let req = test::TestRequest::get()
        .uri(&format!("/blog/search/?query={}", "a".repeat(201)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["results"].as_array().unwrap().is_empty());
    assert_eq!(
        body["data"]["errors"]["query"][0],
        "Query must be 1 to 200 characters."
    );
}

