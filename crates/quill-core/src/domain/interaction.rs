use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three kinds of reader interaction the platform records.
///
/// Views are recorded on every occurrence; reads and likes are
/// idempotent per (user, post) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Read,
    Like,
}

impl InteractionKind {
    /// Whether a second record for the same (user, post) pair is dropped.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, InteractionKind::Read | InteractionKind::Like)
    }
}

/// One entry of a user's recent reading history, as consumed by the
/// suggestion engine: the post that was read and its tag list.
#[derive(Debug, Clone)]
pub struct RecentRead {
    pub post_id: Uuid,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_views_repeat() {
        assert!(!InteractionKind::View.is_idempotent());
        assert!(InteractionKind::Read.is_idempotent());
        assert!(InteractionKind::Like.is_idempotent());
    }
}
