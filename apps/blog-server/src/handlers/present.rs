//! Domain to DTO conversion.

use blog_core::domain::{Comment, Post, Tag};
use blog_core::forms::FormErrors;
use blog_core::pagination::Page;
use blog_core::search::RankedPost;
use blog_core::similar::SimilarPost;
use blog_shared::dto::{
    CommentResponse, FieldErrors, PageResponse, PostResponse, PostSummaryResponse,
    SearchResultResponse, SimilarPostResponse, TagResponse,
};

/// Words kept in a listing excerpt.
const EXCERPT_WORDS: usize = 30;

pub fn tag(tag: &Tag) -> TagResponse {
    TagResponse {
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    }
}

fn tags(post: &Post) -> Vec<TagResponse> {
    post.tags.iter().map(tag).collect()
}

/// First `max_words` words, with an ellipsis when anything was cut.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    let mut excerpt = kept.join(" ");
    if words.next().is_some() {
        excerpt.push_str(" …");
    }
    excerpt
}

pub fn summary(post: &Post) -> PostSummaryResponse {
    PostSummaryResponse {
        id: post.id,
        title: post.title.clone(),
        slug: post.slug.clone(),
        url: post.absolute_path(),
        excerpt: truncate_words(&post.body, EXCERPT_WORDS),
        publish: post.publish,
        tags: tags(post),
    }
}

pub fn post(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        url: post.absolute_path(),
        tags: tags(&post),
        title: post.title,
        slug: post.slug,
        body: post.body,
        publish: post.publish,
        updated_at: post.updated_at,
    }
}

pub fn comment(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        name: comment.name,
        body: comment.body,
        created: comment.created_at,
    }
}

pub fn similar(similar: SimilarPost) -> SimilarPostResponse {
    SimilarPostResponse {
        post: summary(&similar.post),
        shared_tags: similar.shared_tags,
    }
}

pub fn search_result(result: RankedPost) -> SearchResultResponse {
    SearchResultResponse {
        post: summary(&result.post),
        rank: result.rank,
    }
}

pub fn page(page: Page<Post>) -> PageResponse<PostSummaryResponse> {
    PageResponse {
        has_next: page.has_next(),
        has_previous: page.has_previous(),
        next_page: page.next_page_number(),
        previous_page: page.previous_page_number(),
        number: page.number,
        num_pages: page.num_pages,
        count: page.count,
        items: page.items.iter().map(summary).collect(),
    }
}

pub fn errors(errors: FormErrors) -> FieldErrors {
    errors.into_inner()
}
