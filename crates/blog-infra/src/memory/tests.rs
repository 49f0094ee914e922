use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, PublishDay, Tag};
use blog_core::error::DomainError;
use blog_core::forms::{CommentForm, EmailPostForm};
use blog_core::ports::PostRepository;
use blog_core::BlogService;

use super::InMemoryBlogStore;
use crate::mail::InMemoryMailer;

const ORIGIN: &str = "http://localhost:8080";

fn post(title: &str, days_ago: i64, tags: &[&Tag]) -> Post {
    let publish = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap() - Duration::days(days_ago);
    Post::new(Uuid::new_v4(), title.to_owned(), format!("All about {title}."))
        .published_at(publish)
        .with_tags(tags.iter().map(|t| (*t).clone()).collect())
}

struct Fixture {
    store: Arc<InMemoryBlogStore>,
    mailer: Arc<InMemoryMailer>,
    service: BlogService,
}

fn fixture_with(mailer: InMemoryMailer) -> Fixture {
    let store = Arc::new(InMemoryBlogStore::new());
    let mailer = Arc::new(mailer);
    let service = BlogService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        mailer.clone(),
        "blog@example.com",
    );
    Fixture {
        store,
        mailer,
        service,
    }
}

fn fixture() -> Fixture {
    fixture_with(InMemoryMailer::new())
}

/// Seven published posts, newest first p0..p6, plus one draft.
async fn seed(store: &InMemoryBlogStore) -> (Tag, Vec<Post>) {
    let rust = Tag::new("Rust");
    let mut posts = Vec::new();
    for i in 0..7 {
        let tags: Vec<&Tag> = if i % 2 == 0 { vec![&rust] } else { vec![] };
        let p = post(&format!("Post {i}"), i, &tags);
        store.insert_post(p.clone()).await;
        posts.push(p);
    }
    store
        .insert_post(Post::new(Uuid::new_v4(), "Draft".into(), "Hidden".into()).with_tags(vec![rust.clone()]))
        .await;
    (rust, posts)
}

fn titles(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.title.as_str()).collect()
}

#[tokio::test]
async fn test_list_posts_paginates_newest_first() {
    let f = fixture();
    seed(&f.store).await;

    let listing = f.service.list_posts(None, None).await.unwrap();
    assert_eq!(listing.page.number, 1);
    assert_eq!(listing.page.num_pages, 3);
    assert_eq!(listing.page.count, 7);
    assert_eq!(titles(&listing.page.items), vec!["Post 0", "Post 1", "Post 2"]);

    let last = f.service.list_posts(None, Some("3")).await.unwrap();
    assert_eq!(titles(&last.page.items), vec!["Post 6"]);
    assert!(!last.page.has_next());
}

#[tokio::test]
async fn test_list_posts_tolerates_bad_page_numbers() {
    let f = fixture();
    seed(&f.store).await;

    let first = f.service.list_posts(None, Some("abc")).await.unwrap();
    assert_eq!(first.page.number, 1);

    let last = f.service.list_posts(None, Some("9999")).await.unwrap();
    assert_eq!(last.page.number, 3);
    assert_eq!(titles(&last.page.items), vec!["Post 6"]);
}

#[tokio::test]
async fn test_list_posts_by_tag() {
    let f = fixture();
    let (rust, _) = seed(&f.store).await;

    let listing = f.service.list_posts(Some("rust"), None).await.unwrap();
    assert_eq!(listing.tag.as_ref().map(|t| t.id), Some(rust.id));
    assert_eq!(listing.page.count, 4);
    assert!(listing.page.items.iter().all(|p| p.has_tag(rust.id)));
    assert_eq!(titles(&listing.page.items), vec!["Post 0", "Post 2", "Post 4"]);
}

#[tokio::test]
async fn test_list_posts_unknown_tag() {
    let f = fixture();
    seed(&f.store).await;

    let err = f.service.list_posts(Some("cobol"), None).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "tag", .. }));
}

#[tokio::test]
async fn test_empty_blog_has_one_empty_page() {
    let f = fixture();
    let listing = f.service.list_posts(None, Some("2")).await.unwrap();
    assert_eq!(listing.page.number, 1);
    assert_eq!(listing.page.num_pages, 1);
    assert!(listing.page.items.is_empty());
}

#[tokio::test]
async fn test_post_detail_shows_active_comments_only() {
    let f = fixture();
    let (_, posts) = seed(&f.store).await;
    let target = &posts[0];

    let visible = Comment::new(target.id, "Ada".into(), "ada@example.com".into(), "Great".into());
    let mut hidden = Comment::new(target.id, "Eve".into(), "eve@example.com".into(), "Spam".into());
    hidden.active = false;
    f.store.insert_comment(visible.clone()).await;
    f.store.insert_comment(hidden).await;

    let day = PublishDay::new(2024, 6, 30);
    let detail = f.service.post_detail(day, &target.slug).await.unwrap();

    assert_eq!(detail.post.id, target.id);
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].id, visible.id);
}

#[tokio::test]
async fn test_post_detail_requires_matching_day() {
    let f = fixture();
    let (_, posts) = seed(&f.store).await;

    let err = f
        .service
        .post_detail(PublishDay::new(2024, 6, 29), &posts[0].slug)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));

    let err = f
        .service
        .post_detail(PublishDay::new(2024, 2, 31), &posts[0].slug)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_drafts_are_invisible() {
    let f = fixture();
    seed(&f.store).await;
    let draft = f.store.post_by_slug("draft").await.unwrap();

    assert!(f.service.published_post(draft.id).await.is_err());
    let all = f.service.sitemap().await.unwrap();
    assert_eq!(all.len(), 7);
    assert!(all.iter().all(Post::is_published));
}

#[tokio::test]
async fn test_similar_posts_order() {
    let f = fixture();
    let a = Tag::new("a");
    let b = Tag::new("b");
    let c = Tag::new("c");

    let subject = post("Subject", 0, &[&a, &b, &c]);
    let two_old = post("Two old", 10, &[&a, &b]);
    let two_new = post("Two new", 5, &[&b, &c]);
    let one = post("One", 1, &[&c]);
    let three = post("Three", 20, &[&a, &b, &c]);
    let none = post("None", 2, &[]);
    let extra = post("Extra", 30, &[&a]);
    for p in [&subject, &two_old, &two_new, &one, &three, &none, &extra] {
        f.store.insert_post(p.clone()).await;
    }

    let similar = f.service.similar_posts(&subject).await.unwrap();
    let ranked: Vec<(&str, u32)> = similar
        .iter()
        .map(|s| (s.post.title.as_str(), s.shared_tags))
        .collect();

    assert_eq!(
        ranked,
        vec![("Three", 3), ("Two new", 2), ("Two old", 2), ("One", 1)]
    );
}

#[tokio::test]
async fn test_search_applies_threshold_and_rank_order() {
    let f = fixture();
    let title_only = Post::new(Uuid::new_v4(), "Ownership".into(), "Memory rules.".into())
        .published_at(Utc::now());
    let title_and_body = Post::new(
        Uuid::new_v4(),
        "Ownership explained".into(),
        "Ownership moves values.".into(),
    )
    .published_at(Utc::now() - Duration::days(3));
    let body_once = Post::new(
        Uuid::new_v4(),
        "Borrowing".into(),
        "Borrowing relates to ownership.".into(),
    )
    .published_at(Utc::now());
    for p in [&title_only, &title_and_body, &body_once] {
        f.store.insert_post(p.clone()).await;
    }

    let outcome = f.service.search(Some("ownership".into())).await.unwrap();
    assert_eq!(outcome.query.as_deref(), Some("ownership"));
    let found: Vec<&str> = outcome.results.iter().map(|r| r.post.title.as_str()).collect();
    assert_eq!(found, vec!["Ownership explained", "Ownership"]);
    assert!(outcome.results.iter().all(|r| r.rank >= 0.3));
}

#[tokio::test]
async fn test_search_without_or_with_blank_query() {
    let f = fixture();
    seed(&f.store).await;

    let untouched = f.service.search(None).await.unwrap();
    assert!(untouched.query.is_none());
    assert!(untouched.results.is_empty());
    assert!(untouched.errors.is_empty());

    let blank = f.service.search(Some("   ".into())).await.unwrap();
    assert!(blank.query.is_none());
    assert!(blank.errors.field("query").is_some());
}

#[tokio::test]
async fn test_search_stopwords_only_finds_nothing() {
    let f = fixture();
    seed(&f.store).await;
    assert!(f.store.search("the and of", 0.3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_comment_saves_active_comment() {
    let f = fixture();
    let (_, posts) = seed(&f.store).await;

    let form = CommentForm {
        name: " Ada ".into(),
        email: "ada@example.com".into(),
        body: "Loved it".into(),
    };
    let outcome = f.service.add_comment(posts[1].id, form).await.unwrap();

    let comment = outcome.comment.unwrap();
    assert!(outcome.errors.is_empty());
    assert_eq!(comment.name, "Ada");
    assert!(comment.active);

    let detail = f
        .service
        .post_detail(PublishDay::new(2024, 6, 29), &posts[1].slug)
        .await
        .unwrap();
    assert_eq!(detail.comments.len(), 1);
}

#[tokio::test]
async fn test_add_comment_invalid_form_saves_nothing() {
    let f = fixture();
    let (_, posts) = seed(&f.store).await;

    let form = CommentForm {
        name: String::new(),
        email: "nope".into(),
        body: "Hi".into(),
    };
    let outcome = f.service.add_comment(posts[0].id, form).await.unwrap();

    assert!(outcome.comment.is_none());
    assert!(outcome.errors.field("name").is_some());
    assert!(outcome.errors.field("email").is_some());
    assert!(f.store.store.read().await.comments.is_empty());
}

#[tokio::test]
async fn test_add_comment_to_missing_post() {
    let f = fixture();
    let err = f
        .service
        .add_comment(Uuid::new_v4(), CommentForm::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "post", .. }));
}

fn share_form(to: &str) -> EmailPostForm {
    EmailPostForm {
        name: "Ada".into(),
        email: "ada@example.com".into(),
        to: to.into(),
        comment: "Worth a read".into(),
    }
}

#[tokio::test]
async fn test_share_post_sends_mail() {
    let f = fixture();
    let (_, posts) = seed(&f.store).await;

    let outcome = f
        .service
        .share_post(posts[0].id, share_form("bob@example.com"), ORIGIN)
        .await
        .unwrap();
    assert!(outcome.sent);

    let outbox = f.mailer.outbox().await;
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, vec!["bob@example.com".to_string()]);
    assert_eq!(outbox[0].subject, "Ada recommends you read Post 0");
    assert!(outbox[0].body.contains("http://localhost:8080/blog/2024/6/30/post-0/"));
}

#[tokio::test]
async fn test_share_post_invalid_form_sends_nothing() {
    let f = fixture();
    let (_, posts) = seed(&f.store).await;

    let outcome = f
        .service
        .share_post(posts[0].id, share_form("not-an-email"), ORIGIN)
        .await
        .unwrap();

    assert!(!outcome.sent);
    assert!(outcome.errors.field("to").is_some());
    assert!(f.mailer.outbox().await.is_empty());
}

#[tokio::test]
async fn test_share_post_mail_failure() {
    let f = fixture_with(InMemoryMailer::failing("relay down"));
    let (_, posts) = seed(&f.store).await;

    let err = f
        .service
        .share_post(posts[0].id, share_form("bob@example.com"), ORIGIN)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Mail(_)));
}
