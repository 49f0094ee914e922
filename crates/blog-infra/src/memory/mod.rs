//! In-memory blog store - used when no database is configured, and in tests.
//!
//! Implements the post, comment and tag repositories over one shared store.
//! Search ranks posts with the in-process `ts_rank` port, so results follow
//! the same threshold and ordering rules as the PostgreSQL adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Comment, Post, Tag};
use blog_core::error::RepoError;
use blog_core::ports::{CommentRepository, PostRepository, TagRepository};
use blog_core::search::{self, RankedPost, TextQuery, post_document, ts_rank};
use blog_core::similar::{SimilarPost, rank_similar};

#[derive(Default)]
struct Store {
    posts: HashMap<Uuid, Post>,
    tags: HashMap<Uuid, Tag>,
    comments: HashMap<Uuid, Comment>,
}

impl Store {
    /// Published posts, newest first.
    fn published(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.values().filter(|p| p.is_published()).collect();
        posts.sort_by(|a, b| b.publish.cmp(&a.publish).then_with(|| a.id.cmp(&b.id)));
        posts
    }

    fn published_tagged(&self, tag_id: Option<Uuid>) -> Vec<&Post> {
        self.published()
            .into_iter()
            .filter(|p| tag_id.is_none_or(|t| p.has_tag(t)))
            .collect()
    }
}

/// Blog store backed by hash maps behind an async RwLock.
///
/// Note: Data is lost on process restart.
pub struct InMemoryBlogStore {
    store: RwLock<Store>,
}

impl InMemoryBlogStore {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
        }
    }

    /// Insert or replace a post; its tags are registered as well.
    pub async fn insert_post(&self, post: Post) {
        let mut store = self.store.write().await;
        for tag in &post.tags {
            store.tags.entry(tag.id).or_insert_with(|| tag.clone());
        }
        store.posts.insert(post.id, post);
    }

    pub async fn insert_tag(&self, tag: Tag) {
        self.store.write().await.tags.insert(tag.id, tag);
    }

    pub async fn insert_comment(&self, comment: Comment) {
        self.store.write().await.comments.insert(comment.id, comment);
    }

    /// Find a tag by slug.
    pub async fn tag_by_slug(&self, slug: &str) -> Option<Tag> {
        let store = self.store.read().await;
        store.tags.values().find(|t| t.slug == slug).cloned()
    }

    /// Find any post, published or not, by slug.
    pub async fn post_by_slug(&self, slug: &str) -> Option<Post> {
        let store = self.store.read().await;
        store.posts.values().find(|p| p.slug == slug).cloned()
    }

    pub async fn post_count(&self) -> usize {
        self.store.read().await.posts.len()
    }
}

impl Default for InMemoryBlogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for InMemoryBlogStore {
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.posts.get(&id).filter(|p| p.is_published()).cloned())
    }

    async fn find_published_by_slug(
        &self,
        slug: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .published()
            .into_iter()
            .find(|p| p.slug == slug && p.publish >= start && p.publish < end)
            .cloned())
    }

    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError> {
        let store = self.store.read().await;
        Ok(store.published_tagged(tag_id).len() as u64)
    }

    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .published_tagged(tag_id)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_similar(
        &self,
        post: &Post,
        limit: usize,
    ) -> Result<Vec<SimilarPost>, RepoError> {
        let store = self.store.read().await;
        let candidates = store.published().into_iter().cloned();
        Ok(rank_similar(post, candidates, limit))
    }

    async fn search(&self, query: &str, min_rank: f32) -> Result<Vec<RankedPost>, RepoError> {
        let query = TextQuery::parse(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let store = self.store.read().await;
        let ranked = store
            .published()
            .into_iter()
            .map(|post| RankedPost {
                rank: ts_rank(&post_document(post), &query),
                post: post.clone(),
            })
            .collect();

        Ok(search::finalize(ranked, min_rank))
    }

    async fn all_published(&self) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.published().into_iter().cloned().collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryBlogStore {
    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut store = self.store.write().await;
        if !store.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }
        store.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_active_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let store = self.store.read().await;
        let mut comments: Vec<Comment> = store
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.active)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }
}

#[async_trait]
impl TagRepository for InMemoryBlogStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        Ok(self.tag_by_slug(slug).await)
    }
}

#[cfg(test)]
mod tests;
