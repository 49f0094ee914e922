//! Tag co-occurrence ranking for "similar posts".

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::Post;

/// How many similar posts a detail page shows.
pub const SIMILAR_POSTS_LIMIT: usize = 4;

#[derive(Debug, Clone, Serialize)]
pub struct SimilarPost {
    pub post: Post,
    pub shared_tags: u32,
}

/// Rank `candidates` against `post` by shared tag count.
///
/// Excludes `post` itself, unpublished candidates and candidates sharing no tag.
/// Order: shared tags desc, publish desc, id asc.
pub fn rank_similar<I>(post: &Post, candidates: I, limit: usize) -> Vec<SimilarPost>
where
    I: IntoIterator<Item = Post>,
{
    let tag_ids: HashSet<Uuid> = post.tags.iter().map(|t| t.id).collect();
    if tag_ids.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<SimilarPost> = candidates
        .into_iter()
        .filter(|c| c.id != post.id && c.is_published())
        .filter_map(|c| {
            let shared = c.tags.iter().filter(|t| tag_ids.contains(&t.id)).count() as u32;
            (shared > 0).then_some(SimilarPost {
                post: c,
                shared_tags: shared,
            })
        })
        .collect();

    sort_similar(&mut ranked);
    ranked.truncate(limit);
    ranked
}

/// Deterministic ordering shared by every repository implementation.
pub fn sort_similar(posts: &mut [SimilarPost]) {
    posts.sort_by(compare);
}

fn compare(a: &SimilarPost, b: &SimilarPost) -> Ordering {
    b.shared_tags
        .cmp(&a.shared_tags)
        .then_with(|| b.post.publish.cmp(&a.post.publish))
        .then_with(|| a.post.id.cmp(&b.post.id))
}
