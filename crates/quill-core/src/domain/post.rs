use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication status of a post.
///
/// Only `Published` posts are visible to readers and eligible for
/// suggestion or popularity ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Unpublished,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Unpublished => "unpublished",
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "unpublished" => Ok(PostStatus::Unpublished),
            other => Err(format!("unknown post status: {}", other)),
        }
    }
}

/// Post entity - a blog post authored by a user.
///
/// Tags carry set semantics at the domain level: duplicates and
/// surrounding whitespace are stripped on construction and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post.
    pub fn new(author_id: Uuid, title: String, content: String, tags: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            tags: normalize_tags(tags),
            status: PostStatus::Draft,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Replace the tag list, normalizing it to set semantics.
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = normalize_tags(tags);
    }
}

/// Trim tags and collapse duplicates while preserving first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !seen.iter().any(|t: &String| t == trimmed) {
            seen.push(trimmed.to_string());
        }
    }
    seen
}
