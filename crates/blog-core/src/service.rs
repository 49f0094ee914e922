//! Blog use cases on top of the ports.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Comment, Post, PublishDay, Tag};
use crate::error::DomainError;
use crate::forms::{CommentForm, EmailPostForm, Form, FormErrors, SearchForm};
use crate::pagination::{POSTS_PER_PAGE, Page, Paginator};
use crate::ports::{CommentRepository, Mailer, OutgoingMail, PostRepository, TagRepository};
use crate::search::{self, RankedPost, SEARCH_RANK_THRESHOLD};
use crate::similar::{SIMILAR_POSTS_LIMIT, SimilarPost};

/// A page of the post listing, optionally restricted to one tag.
#[derive(Debug)]
pub struct PostListing {
    pub page: Page<Post>,
    pub tag: Option<Tag>,
}

#[derive(Debug)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub similar: Vec<SimilarPost>,
}

/// `query` is only set once a submitted query passed validation.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub query: Option<String>,
    pub results: Vec<RankedPost>,
    pub errors: FormErrors,
}

/// Either the saved comment or the reasons it was rejected.
#[derive(Debug)]
pub struct CommentOutcome {
    pub post: Post,
    pub comment: Option<Comment>,
    pub errors: FormErrors,
}

#[derive(Debug)]
pub struct ShareOutcome {
    pub post: Post,
    pub sent: bool,
    pub errors: FormErrors,
}

/// Blog service - every reader-facing operation.
pub struct BlogService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    tags: Arc<dyn TagRepository>,
    mailer: Arc<dyn Mailer>,
    mail_from: String,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        tags: Arc<dyn TagRepository>,
        mailer: Arc<dyn Mailer>,
        mail_from: impl Into<String>,
    ) -> Self {
        Self {
            posts,
            comments,
            tags,
            mailer,
            mail_from: mail_from.into(),
        }
    }

    /// Published posts, newest first, three per page.
    ///
    /// An unknown `tag_slug` is an error; a bad `raw_page` is not (see [`Paginator::resolve`]).
    pub async fn list_posts(
        &self,
        tag_slug: Option<&str>,
        raw_page: Option<&str>,
    ) -> Result<PostListing, DomainError> {
        let tag = match tag_slug.filter(|s| !s.is_empty()) {
            Some(slug) => Some(
                self.tags
                    .find_by_slug(slug)
                    .await?
                    .ok_or_else(|| DomainError::not_found("tag", slug))?,
            ),
            None => None,
        };
        let tag_id = tag.as_ref().map(|t| t.id);

        let paginator = Paginator::new(self.posts.count_published(tag_id).await?, POSTS_PER_PAGE);
        let number = paginator.resolve(raw_page);
        let (offset, limit) = paginator.window(number);
        let items = self.posts.list_published(tag_id, offset, limit).await?;

        Ok(PostListing {
            page: paginator.page(number, items),
            tag,
        })
    }

    /// A published post addressed by publish day and slug, with its active
    /// comments and similar posts.
    pub async fn post_detail(&self, day: PublishDay, slug: &str) -> Result<PostDetail, DomainError> {
        let (start, end) = day
            .bounds()
            .ok_or_else(|| DomainError::not_found("post", slug))?;
        let post = self
            .posts
            .find_published_by_slug(slug, start, end)
            .await?
            .ok_or_else(|| DomainError::not_found("post", slug))?;

        let comments = self.comments.find_active_by_post(post.id).await?;
        let similar = self.similar_posts(&post).await?;

        Ok(PostDetail {
            post,
            comments,
            similar,
        })
    }

    pub async fn similar_posts(&self, post: &Post) -> Result<Vec<SimilarPost>, DomainError> {
        if post.tags.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.posts.find_similar(post, SIMILAR_POSTS_LIMIT).await?)
    }

    pub async fn published_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_published(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    /// Ranked search. `None` means no query was submitted at all.
    pub async fn search(&self, query: Option<String>) -> Result<SearchOutcome, DomainError> {
        let Some(query) = query else {
            return Ok(SearchOutcome::default());
        };

        let form = match (SearchForm { query }).clean() {
            Ok(form) => form,
            Err(errors) => {
                return Ok(SearchOutcome {
                    errors,
                    ..Default::default()
                });
            }
        };

        let results = self
            .posts
            .search(&form.query, SEARCH_RANK_THRESHOLD)
            .await?;

        Ok(SearchOutcome {
            query: Some(form.query),
            results: search::finalize(results, SEARCH_RANK_THRESHOLD),
            errors: FormErrors::default(),
        })
    }

    /// Attach a new active comment to a published post, if the form is valid.
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        form: CommentForm,
    ) -> Result<CommentOutcome, DomainError> {
        let post = self.published_post(post_id).await?;

        match form.clean() {
            Ok(cd) => {
                let comment = Comment::new(post.id, cd.name, cd.email, cd.body);
                let saved = self.comments.save(comment).await?;
                Ok(CommentOutcome {
                    post,
                    comment: Some(saved),
                    errors: FormErrors::default(),
                })
            }
            Err(errors) => Ok(CommentOutcome {
                post,
                comment: None,
                errors,
            }),
        }
    }

    /// Email a recommendation for a published post. Nothing is sent for an invalid form.
    ///
    /// `origin` is the scheme and host the reader used, e.g. `https://example.com`.
    pub async fn share_post(
        &self,
        post_id: Uuid,
        form: EmailPostForm,
        origin: &str,
    ) -> Result<ShareOutcome, DomainError> {
        let post = self.published_post(post_id).await?;

        let cd = match form.clean() {
            Ok(cd) => cd,
            Err(errors) => {
                return Ok(ShareOutcome {
                    post,
                    sent: false,
                    errors,
                });
            }
        };

        let mail = share_mail(&post, &cd, origin, &self.mail_from);
        self.mailer.send(&mail).await?;

        Ok(ShareOutcome {
            post,
            sent: true,
            errors: FormErrors::default(),
        })
    }

    /// Every published post, for the sitemap.
    pub async fn sitemap(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.all_published().await?)
    }
}

/// The recommendation email for `post`.
pub fn share_mail(post: &Post, cd: &EmailPostForm, origin: &str, from: &str) -> OutgoingMail {
    let post_url = post.absolute_url(origin);
    OutgoingMail {
        from: from.to_owned(),
        to: vec![cd.to.clone()],
        subject: format!("{} recommends you read {}", cd.name, post.title),
        body: format!(
            "Read {} at {}\n\n{}'s comments: {}",
            post.title, post_url, cd.name, cd.comment
        ),
    }
}
