//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, JoinType, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Statement,
};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, Tag};
use blog_core::error::RepoError;
use blog_core::ports::{CommentRepository, PostRepository, TagRepository};
use blog_core::search::{RankedPost, SEARCH_CONFIG};
use blog_core::similar::{SimilarPost, sort_similar};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

/// Weighted title/body rank, mirroring the GIN index expression in the migration.
fn search_sql() -> String {
    let cfg = SEARCH_CONFIG;
    format!(
        "SELECT id, rank FROM (\
            SELECT p.id, p.publish, ts_rank(\
                setweight(to_tsvector('{cfg}', coalesce(p.title, '')), 'A') || \
                setweight(to_tsvector('{cfg}', coalesce(p.body, '')), 'B'), \
                plainto_tsquery('{cfg}', $1)) AS rank \
            FROM posts p WHERE p.status = 'PB'\
        ) ranked \
        WHERE rank >= $2 \
        ORDER BY rank DESC, publish DESC"
    )
}

#[derive(Debug, FromQueryResult)]
struct SearchHit {
    id: Uuid,
    rank: f32,
}

#[derive(Debug, FromQueryResult)]
struct SharedTags {
    post_id: Uuid,
    shared_tags: i64,
}

fn published() -> Select<PostEntity> {
    PostEntity::find().filter(post::Column::Status.eq(post::Status::Published))
}

fn tagged(select: Select<PostEntity>, tag_id: Option<Uuid>) -> Select<PostEntity> {
    match tag_id {
        Some(tag_id) => select.filter(
            post::Column::Id.in_subquery(
                Query::select()
                    .column(post_tag::Column::PostId)
                    .from(PostTagEntity)
                    .and_where(post_tag::Column::TagId.eq(tag_id))
                    .to_owned(),
            ),
        ),
        None => select,
    }
}

impl PostgresPostRepository {
    /// Convert models to domain posts with their tags attached.
    async fn with_tags(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let tags = models
            .load_many_to_many(TagEntity, PostTagEntity, self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(models
            .into_iter()
            .zip(tags)
            .map(|(model, tags)| Post::from(model).with_tags(tags.into_iter().map(Into::into).collect()))
            .collect())
    }

    async fn one_with_tags(&self, model: Option<post::Model>) -> Result<Option<Post>, RepoError> {
        match model {
            Some(model) => Ok(self.with_tags(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Published posts by id, keyed for reordering.
    async fn published_by_ids(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, Post>, RepoError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = published()
            .filter(post::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(self
            .with_tags(models)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = published()
            .filter(post::Column::Id.eq(id))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        self.one_with_tags(model).await
    }

    async fn find_published_by_slug(
        &self,
        slug: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        tracing::debug!(slug, %start, "Finding post by publish day and slug");

        let model = published()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::Publish.gte(start))
            .filter(post::Column::Publish.lt(end))
            .order_by_desc(post::Column::Publish)
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        self.one_with_tags(model).await
    }

    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError> {
        tagged(published(), tag_id)
            .count(self.db.as_ref())
            .await
            .map_err(query_error)
    }

    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let models = tagged(published(), tag_id)
            .order_by_desc(post::Column::Publish)
            .order_by_asc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        self.with_tags(models).await
    }

    async fn find_similar(
        &self,
        post: &Post,
        limit: usize,
    ) -> Result<Vec<SimilarPost>, RepoError> {
        let tag_ids: Vec<Uuid> = post.tags.iter().map(|t| t.id).collect();
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = PostTagEntity::find()
            .select_only()
            .column(post_tag::Column::PostId)
            .column_as(
                Expr::col((PostTagEntity, post_tag::Column::TagId)).count(),
                "shared_tags",
            )
            .join(JoinType::InnerJoin, post_tag::Relation::Post.def())
            .filter(post_tag::Column::TagId.is_in(tag_ids))
            .filter(post_tag::Column::PostId.ne(post.id))
            .filter(post::Column::Status.eq(post::Status::Published))
            .group_by(post_tag::Column::PostId)
            .group_by(post::Column::Publish)
            .order_by_desc(Expr::cust("shared_tags"))
            .order_by_desc(post::Column::Publish)
            .order_by_asc(post_tag::Column::PostId)
            .limit(limit as u64)
            .into_model::<SharedTags>()
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        let mut posts = self
            .published_by_ids(rows.iter().map(|r| r.post_id).collect())
            .await?;

        let mut similar: Vec<SimilarPost> = rows
            .into_iter()
            .filter_map(|row| {
                posts.remove(&row.post_id).map(|post| SimilarPost {
                    post,
                    shared_tags: row.shared_tags as u32,
                })
            })
            .collect();
        sort_similar(&mut similar);

        Ok(similar)
    }

    async fn search(&self, query: &str, min_rank: f32) -> Result<Vec<RankedPost>, RepoError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            search_sql(),
            [query.into(), min_rank.into()],
        );

        let hits = SearchHit::find_by_statement(stmt)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;
        tracing::debug!(query, hits = hits.len(), "Full-text search");

        let mut posts = self
            .published_by_ids(hits.iter().map(|h| h.id).collect())
            .await?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                posts.remove(&hit.id).map(|post| RankedPost {
                    post,
                    rank: hit.rank,
                })
            })
            .collect())
    }

    async fn all_published(&self) -> Result<Vec<Post>, RepoError> {
        let models = published()
            .order_by_desc(post::Column::Publish)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        self.with_tags(models).await
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let model = self.upsert(comment.into()).await?;
        Ok(model.into())
    }

    async fn find_active_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Active.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}
