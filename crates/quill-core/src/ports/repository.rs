use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, User};
use crate::error::RepoError;

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their unique ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Save a user (create or update).
    async fn save(&self, user: User) -> Result<User, RepoError>;
}

/// Sort order for published-post queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrder {
    /// Newest first, post id descending as deterministic tie-break.
    #[default]
    CreatedAtDesc,
}

/// Typed filter specification for querying published posts.
///
/// Replaces ad-hoc string-built predicates: tag intersection is expressed
/// as `tags_any` and resolved against the normalized tag table.
#[derive(Debug, Clone, Default)]
pub struct PublishedFilter {
    /// Match posts whose tag list intersects this set. Empty = no tag filter.
    pub tags_any: Vec<String>,
    /// Exclude posts with these ids.
    pub exclude_ids: Vec<Uuid>,
    pub order: PostOrder,
    /// Maximum number of rows; `None` = unbounded.
    pub limit: Option<u64>,
}

impl PublishedFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_tags_any(mut self, tags: Vec<String>) -> Self {
        self.tags_any = tags;
        self
    }

    pub fn excluding(mut self, ids: Vec<Uuid>) -> Self {
        self.exclude_ids = ids;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Post repository.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Find a post by its unique ID, regardless of status.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// All posts by one author, any status, newest first.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// All posts regardless of status, newest first. Admin listing.
    async fn find_all(&self) -> Result<Vec<Post>, RepoError>;

    /// Published posts matching the filter, in the filter's order.
    async fn find_published(&self, filter: PublishedFilter) -> Result<Vec<Post>, RepoError>;

    /// View-event counts grouped by post id. Posts without any view
    /// event are absent from the map.
    async fn count_views_by_post(&self) -> Result<HashMap<Uuid, i64>, RepoError>;

    /// Case-insensitive substring search over title, content and tags
    /// of published posts.
    async fn search(&self, query: &str) -> Result<Vec<Post>, RepoError>;

    /// Save a post (create or update), including its tag list.
    async fn save(&self, post: Post) -> Result<Post, RepoError>;

    /// Delete a post by its ID.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Bump the denormalized view counter on a post detail fetch.
    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError>;
}
