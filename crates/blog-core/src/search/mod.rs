//! Full-text search policy.
//!
//! Posts are ranked against a query over a weighted document: the title carries
//! weight `A`, the body weight `B`. Results below [`SEARCH_RANK_THRESHOLD`] are
//! dropped and the rest are ordered by rank, best first.

mod rank;

use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::Post;

pub use rank::{TextQuery, Weight, WeightedDocument, ts_rank};

/// Minimum rank a post needs to appear in search results.
pub const SEARCH_RANK_THRESHOLD: f32 = 0.3;

/// Text search configuration used by the database adapter.
pub const SEARCH_CONFIG: &str = "english";

#[derive(Debug, Clone, Serialize)]
pub struct RankedPost {
    pub post: Post,
    pub rank: f32,
}

/// Weighted document for a post: title as `A`, body as `B`.
pub fn post_document(post: &Post) -> WeightedDocument {
    let mut doc = WeightedDocument::new();
    doc.append(&post.title, Weight::A);
    doc.append(&post.body, Weight::B);
    doc
}

/// Drop results under `min_rank`, then order by rank desc, publish desc.
pub fn finalize(mut results: Vec<RankedPost>, min_rank: f32) -> Vec<RankedPost> {
    results.retain(|r| r.rank >= min_rank);
    results.sort_by(|a, b| {
        b.rank
            .partial_cmp(&a.rank)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.post.publish.cmp(&a.post.publish))
    });
    results
}
