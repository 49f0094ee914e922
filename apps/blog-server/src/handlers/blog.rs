//! Blog handlers - listing, detail, search, comments and sharing.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use blog_core::domain::PublishDay;
use blog_core::forms::{CommentForm, EmailPostForm};
use blog_shared::ApiResponse;
use blog_shared::dto::{
    CommentSubmissionResponse, PostDetailResponse, PostListResponse, SearchResponse,
    ShareResponse,
};

use super::{present, request_origin};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Raw page number; anything unparsable falls back to page 1.
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

async fn list(
    state: &AppState,
    tag_slug: Option<&str>,
    page: Option<&str>,
) -> AppResult<HttpResponse> {
    let listing = state.blog.list_posts(tag_slug, page).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostListResponse {
        tag: listing.tag.as_ref().map(present::tag),
        posts: present::page(listing.page),
    })))
}

/// GET /blog/
pub async fn post_list(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    list(&state, None, query.page.as_deref()).await
}

/// GET /blog/tag/{tag_slug}/
pub async fn post_list_by_tag(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    list(&state, Some(path.as_str()), query.page.as_deref()).await
}

/// GET /blog/{year}/{month}/{day}/{post}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<(i32, u32, u32, String)>,
) -> AppResult<HttpResponse> {
    let (year, month, day, slug) = path.into_inner();
    let detail = state
        .blog
        .post_detail(PublishDay::new(year, month, day), &slug)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostDetailResponse {
        post: present::post(detail.post),
        comments: detail.comments.into_iter().map(present::comment).collect(),
        similar_posts: detail.similar.into_iter().map(present::similar).collect(),
    })))
}

/// GET /blog/{post_id}/share/
pub async fn share_form(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.blog.published_post(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ShareResponse {
        post: present::summary(&post),
        sent: false,
        errors: Default::default(),
    })))
}

/// POST /blog/{post_id}/share/
pub async fn share_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<EmailPostForm>,
) -> AppResult<HttpResponse> {
    let origin = request_origin(&req);
    let outcome = state
        .blog
        .share_post(path.into_inner(), form.into_inner(), &origin)
        .await?;

    let response = ShareResponse {
        post: present::summary(&outcome.post),
        sent: outcome.sent,
        errors: present::errors(outcome.errors),
    };

    Ok(HttpResponse::Ok().json(if response.sent {
        tracing::info!(post_id = %response.post.id, "Post shared by email");
        ApiResponse::ok_with_message(response, "Email sent")
    } else {
        ApiResponse::ok(response)
    }))
}

/// POST /blog/{post_id}/comment/
pub async fn post_comment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .add_comment(path.into_inner(), form.into_inner())
        .await?;

    let response = CommentSubmissionResponse {
        post: present::summary(&outcome.post),
        comment: outcome.comment.map(present::comment),
        errors: present::errors(outcome.errors),
    };

    Ok(HttpResponse::Ok().json(if response.comment.is_some() {
        ApiResponse::ok_with_message(response, "Comment added")
    } else {
        ApiResponse::ok(response)
    }))
}

/// Any other method on the comment resource.
pub async fn comment_method_not_allowed() -> AppResult<HttpResponse> {
    Err(AppError::MethodNotAllowed("POST"))
}

/// GET /blog/search/?query=
pub async fn post_search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let outcome = state.blog.search(query.into_inner().query).await?;
    tracing::debug!(query = ?outcome.query, hits = outcome.results.len(), "Search");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(SearchResponse {
        query: outcome.query,
        results: outcome
            .results
            .into_iter()
            .map(present::search_result)
            .collect(),
        errors: present::errors(outcome.errors),
    })))
}
