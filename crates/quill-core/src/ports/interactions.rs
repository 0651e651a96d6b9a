use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::RecentRead;
use crate::error::RepoError;

/// Store of reader interaction events (views, reads, likes).
///
/// Read and like recording is idempotent: the store enforces at most one
/// row per (user, post) pair, and a duplicate submission is a silent
/// no-op rather than an error. Views are appended unconditionally.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// The user's most recent reads, newest first, joined with the
    /// referenced posts' tags.
    async fn recent_reads(&self, user_id: Uuid, limit: u64) -> Result<Vec<RecentRead>, RepoError>;

    /// Append a view event. Repeats are recorded.
    async fn record_view(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError>;

    /// Record that the user read the post. Duplicate reads are dropped.
    async fn record_read(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError>;

    /// Record that the user liked the post. Duplicate likes are dropped.
    async fn record_like(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError>;
}
