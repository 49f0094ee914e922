use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Comment, Post, Tag};
use crate::error::RepoError;
use crate::search::RankedPost;
use crate::similar::SimilarPost;

/// Read access to posts. Every method only ever sees published posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Find a published post by slug whose publish instant lies in `[start, end)`.
    async fn find_published_by_slug(
        &self,
        slug: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError>;

    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError>;

    /// One window of published posts, newest first.
    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;

    /// Published posts sharing at least one tag with `post`, best matches first.
    async fn find_similar(&self, post: &Post, limit: usize)
    -> Result<Vec<SimilarPost>, RepoError>;

    /// Published posts whose weighted title/body rank against `query` is at least `min_rank`.
    async fn search(&self, query: &str, min_rank: f32) -> Result<Vec<RankedPost>, RepoError>;

    /// Every published post, newest first.
    async fn all_published(&self) -> Result<Vec<Post>, RepoError>;
}

/// Comment storage.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Store a comment, replacing any earlier version with the same id.
    async fn save(&self, comment: Comment) -> Result<Comment, RepoError>;

    /// Active comments of a post, oldest first.
    async fn find_active_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError>;
}
