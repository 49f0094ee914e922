//! JSON fixtures for seeding the in-memory store.
//!
//! ```json
//! {
//!   "authors": [{ "username": "admin", "email": "admin@example.com" }],
//!   "tags": [{ "name": "Rust" }],
//!   "posts": [{
//!     "title": "Hello", "author": "admin", "body": "...",
//!     "publish": "2024-01-05T10:00:00Z", "status": "published", "tags": ["rust"]
//!   }],
//!   "comments": [{ "post": "hello", "name": "Ada", "email": "ada@example.com", "body": "Hi" }]
//! }
//! ```
//!
//! Posts reference authors by username and tags by slug; comments reference
//! posts by slug.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use blog_core::domain::{Comment, Post, PostStatus, Tag};

use crate::memory::InMemoryBlogStore;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to read fixtures: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fixture document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown {kind} '{key}' referenced by {from}")]
    UnknownReference {
        kind: &'static str,
        key: String,
        from: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub authors: Vec<AuthorFixture>,
    pub tags: Vec<TagFixture>,
    pub posts: Vec<PostFixture>,
    pub comments: Vec<CommentFixture>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorFixture {
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TagFixture {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostFixture {
    pub title: String,
    pub slug: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    pub publish: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentFixture {
    pub post: String,
    pub name: String,
    pub email: String,
    pub body: String,
    #[serde(default = "active_default")]
    pub active: bool,
    pub created: Option<DateTime<Utc>>,
}

fn active_default() -> bool {
    true
}

impl Fixtures {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Insert everything into `store`, resolving references as it goes.
    pub async fn load_into(self, store: &InMemoryBlogStore) -> Result<(), FixtureError> {
        let authors: HashMap<String, Uuid> = self
            .authors
            .into_iter()
            .map(|a| (a.username, Uuid::new_v4()))
            .collect();

        let mut tags: HashMap<String, Tag> = HashMap::new();
        for fixture in self.tags {
            let mut tag = Tag::new(fixture.name);
            if let Some(slug) = fixture.slug {
                tag.slug = slug;
            }
            store.insert_tag(tag.clone()).await;
            tags.insert(tag.slug.clone(), tag);
        }

        let mut post_ids: HashMap<String, Uuid> = HashMap::new();
        for fixture in self.posts {
            let author_id = match &fixture.author {
                Some(username) => *authors.get(username).ok_or_else(|| {
                    FixtureError::UnknownReference {
                        kind: "author",
                        key: username.clone(),
                        from: fixture.title.clone(),
                    }
                })?,
                None => Uuid::nil(),
            };

            let post_tags = fixture
                .tags
                .iter()
                .map(|slug| {
                    tags.get(slug).cloned().ok_or_else(|| FixtureError::UnknownReference {
                        kind: "tag",
                        key: slug.clone(),
                        from: fixture.title.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut post = Post::new(author_id, fixture.title, fixture.body).with_tags(post_tags);
            if let Some(slug) = fixture.slug {
                post.slug = slug;
            }
            if let Some(publish) = fixture.publish {
                post.publish = publish;
            }
            post.status = fixture.status;

            post_ids.insert(post.slug.clone(), post.id);
            store.insert_post(post).await;
        }

        for fixture in self.comments {
            let post_id = *post_ids.get(&fixture.post).ok_or_else(|| {
                FixtureError::UnknownReference {
                    kind: "post",
                    key: fixture.post.clone(),
                    from: format!("comment by {}", fixture.name),
                }
            })?;

            let mut comment = Comment::new(post_id, fixture.name, fixture.email, fixture.body);
            comment.active = fixture.active;
            if let Some(created) = fixture.created {
                comment.created_at = created;
                comment.updated_at = created;
            }
            store.insert_comment(comment).await;
        }

        tracing::info!(
            posts = post_ids.len(),
            tags = tags.len(),
            "Fixtures loaded into in-memory store"
        );
        Ok(())
    }
}
