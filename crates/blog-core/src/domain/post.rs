use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tag::{Tag, slugify};

/// Publication state. Only published posts are visible to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    /// Two-letter code stored in the database.
    pub fn code(self) -> &'static str {
        match self {
            PostStatus::Draft => "DF",
            PostStatus::Published => "PB",
        }
    }
}

/// Post entity - represents a blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub status: PostStatus,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post. The slug is derived from the title.
    pub fn new(author_id: Uuid, title: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            slug: slugify(&title),
            title,
            body,
            publish: now,
            status: PostStatus::Draft,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn published_at(mut self, publish: DateTime<Utc>) -> Self {
        self.publish = publish;
        self.status = PostStatus::Published;
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn has_tag(&self, tag_id: Uuid) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    /// Canonical path, e.g. `/blog/2024/1/5/my-post/`.
    pub fn absolute_path(&self) -> String {
        format!(
            "/blog/{}/{}/{}/{}/",
            self.publish.year(),
            self.publish.month(),
            self.publish.day(),
            self.slug
        )
    }

    pub fn absolute_url(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.absolute_path())
    }
}

/// Calendar day (UTC) used to address a post by its publish date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl PublishDay {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Half-open `[start, end)` interval covering the day, or `None` if the date does not exist.
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?;
        let next = date.checked_add_days(Days::new(1))?;
        Some((
            date.and_hms_opt(0, 0, 0)?.and_utc(),
            next.and_hms_opt(0, 0, 0)?.and_utc(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absolute_path_is_unpadded() {
        let publish = Utc.with_ymd_and_hms(2024, 1, 5, 13, 30, 0).unwrap();
        let post = Post::new(Uuid::new_v4(), "Hello World".into(), "body".into())
            .published_at(publish);

        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.absolute_path(), "/blog/2024/1/5/hello-world/");
        assert_eq!(
            post.absolute_url("https://example.com/"),
            "https://example.com/blog/2024/1/5/hello-world/"
        );
    }

    #[test]
    fn test_publish_day_bounds() {
        let (start, end) = PublishDay::new(2024, 2, 29).bounds().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        assert!(PublishDay::new(2023, 2, 29).bounds().is_none());
        assert!(PublishDay::new(2024, 13, 1).bounds().is_none());
    }

    #[test]
    fn test_new_post_is_draft() {
        let post = Post::new(Uuid::new_v4(), "Draft".into(), String::new());
        assert!(!post.is_published());
        assert_eq!(post.status.code(), "DF");
    }
}
