//! The suggestion engine.
//!
//! Turns a user's recent reading history into a ranked list of candidate
//! posts, with a deterministic fallback to global popularity when
//! personalization yields no usable signal or no results.
//!
//! The engine is a pure read-time view over the post and interaction
//! stores: no caching, no incremental state, recomputed on every call.
//! Store failures propagate unchanged; only *empty results* trigger the
//! popularity fallback.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Post;
use crate::error::RepoError;
use crate::ports::{InteractionStore, PostRepository, PublishedFilter};

/// How many of the user's most recent reads feed the affinity signal.
pub const HISTORY_WINDOW: u64 = 5;

/// Maximum number of posts in a suggestion or popularity page.
pub const PAGE_SIZE: u64 = 20;

/// Which policy produced a suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Personalized,
    Popular,
}

/// A ranked suggestion list and the policy that produced it.
#[derive(Debug, Clone)]
pub struct Suggestions {
    pub kind: SuggestionKind,
    pub items: Vec<Post>,
}

/// Tag affinity extracted from a user's recent reads.
///
/// Both sets empty means "no personalization possible" - not an error.
#[derive(Debug, Clone, Default)]
pub struct ReadSignal {
    /// Distinct, whitespace-trimmed tags across the recent reads.
    pub tags: BTreeSet<String>,
    /// Posts the user has already read, excluded from suggestions.
    pub excluded: HashSet<Uuid>,
}

/// Query-time recommender over the post and interaction stores.
pub struct SuggestionEngine {
    posts: Arc<dyn PostRepository>,
    interactions: Arc<dyn InteractionStore>,
}

impl SuggestionEngine {
    pub fn new(posts: Arc<dyn PostRepository>, interactions: Arc<dyn InteractionStore>) -> Self {
        Self {
            posts,
            interactions,
        }
    }

    /// Aggregate the user's recent reading history into a tag set and an
    /// exclusion set. Pure read; a user without history yields empty sets.
    pub async fn recent_signal(&self, user_id: Uuid) -> Result<ReadSignal, RepoError> {
        let recent = self
            .interactions
            .recent_reads(user_id, HISTORY_WINDOW)
            .await?;

        let mut signal = ReadSignal::default();
        for entry in recent {
            signal.excluded.insert(entry.post_id);
            for tag in &entry.tags {
                let trimmed = tag.trim();
                if !trimmed.is_empty() {
                    signal.tags.insert(trimmed.to_string());
                }
            }
        }

        Ok(signal)
    }

    /// Suggest posts for a user.
    ///
    /// Personalized when the user's recent reads carry tags and unread
    /// published posts share at least one of them; otherwise falls back
    /// to the popularity ranking.
    pub async fn suggest(&self, user_id: Uuid) -> Result<Suggestions, RepoError> {
        let signal = self.recent_signal(user_id).await?;

        if signal.tags.is_empty() {
            tracing::debug!(%user_id, "no personalization signal, falling back to popular");
            return Ok(Suggestions {
                kind: SuggestionKind::Popular,
                items: self.popular().await?,
            });
        }

        let filter = PublishedFilter::all()
            .with_tags_any(signal.tags.iter().cloned().collect())
            .excluding(signal.excluded.iter().copied().collect())
            .with_limit(PAGE_SIZE);

        let items = self.posts.find_published(filter).await?;

        if items.is_empty() {
            tracing::debug!(%user_id, "no unread posts match the tag affinity, falling back to popular");
            return Ok(Suggestions {
                kind: SuggestionKind::Popular,
                items: self.popular().await?,
            });
        }

        Ok(Suggestions {
            kind: SuggestionKind::Personalized,
            items,
        })
    }

    /// Rank published posts by view-event count.
    ///
    /// Ties break on creation time (newest first), then post id, so the
    /// order is stable across calls with unchanged data. Posts with zero
    /// views are included and sort last.
    pub async fn popular(&self) -> Result<Vec<Post>, RepoError> {
        let views = self.posts.count_views_by_post().await?;
        let mut posts = self.posts.find_published(PublishedFilter::all()).await?;

        posts.sort_by(|a, b| {
            let va = views.get(&a.id).copied().unwrap_or(0);
            let vb = views.get(&b.id).copied().unwrap_or(0);
            vb.cmp(&va)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        posts.truncate(PAGE_SIZE as usize);

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::domain::{PostStatus, RecentRead};

    /// In-memory post repository backing the engine tests.
    struct InMemoryPosts {
        posts: Mutex<Vec<Post>>,
        views: Mutex<Vec<(Uuid, Uuid)>>,
    }

    impl InMemoryPosts {
        fn new() -> Self {
            Self {
                posts: Mutex::new(Vec::new()),
                views: Mutex::new(Vec::new()),
            }
        }

        fn insert(&self, post: Post) {
            self.posts.lock().unwrap().push(post);
        }

        fn add_views(&self, post_id: Uuid, count: usize) {
            let mut views = self.views.lock().unwrap();
            for _ in 0..count {
                views.push((Uuid::new_v4(), post_id));
            }
        }
    }

    #[async_trait]
    impl PostRepository for InMemoryPosts {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id)
                .cloned())
        }

        async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.author_id == author_id)
                .cloned()
                .collect())
        }

        async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn find_published(&self, filter: PublishedFilter) -> Result<Vec<Post>, RepoError> {
            let mut matched: Vec<Post> = self
                .posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.is_published())
                .filter(|p| !filter.exclude_ids.contains(&p.id))
                .filter(|p| {
                    filter.tags_any.is_empty()
                        || p.tags.iter().any(|t| filter.tags_any.contains(t))
                })
                .cloned()
                .collect();

            matched.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            if let Some(limit) = filter.limit {
                matched.truncate(limit as usize);
            }

            Ok(matched)
        }

        async fn count_views_by_post(&self) -> Result<HashMap<Uuid, i64>, RepoError> {
            let mut counts = HashMap::new();
            for (_, post_id) in self.views.lock().unwrap().iter() {
                *counts.entry(*post_id).or_insert(0) += 1;
            }
            Ok(counts)
        }

        async fn search(&self, query: &str) -> Result<Vec<Post>, RepoError> {
            let needle = query.to_lowercase();
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.is_published())
                .filter(|p| {
                    p.title.to_lowercase().contains(&needle)
                        || p.content.to_lowercase().contains(&needle)
                        || p.tags.iter().any(|t| t.to_lowercase().contains(&needle))
                })
                .cloned()
                .collect())
        }

        async fn save(&self, post: Post) -> Result<Post, RepoError> {
            let mut posts = self.posts.lock().unwrap();
            posts.retain(|p| p.id != post.id);
            posts.push(post.clone());
            Ok(post)
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.posts.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
            let mut posts = self.posts.lock().unwrap();
            match posts.iter_mut().find(|p| p.id == id) {
                Some(post) => {
                    post.view_count += 1;
                    Ok(())
                }
                None => Err(RepoError::NotFound),
            }
        }
    }

    /// In-memory interaction store enforcing the same (user, post)
    /// uniqueness rule for reads as the database schema does.
    struct InMemoryInteractions {
        reads: Mutex<Vec<(Uuid, Uuid, DateTime<Utc>, Vec<String>)>>,
        tags_by_post: Mutex<HashMap<Uuid, Vec<String>>>,
    }

    impl InMemoryInteractions {
        fn new() -> Self {
            Self {
                reads: Mutex::new(Vec::new()),
                tags_by_post: Mutex::new(HashMap::new()),
            }
        }

        fn register_post(&self, post: &Post) {
            self.tags_by_post
                .lock()
                .unwrap()
                .insert(post.id, post.tags.clone());
        }

        fn read_at(&self, user_id: Uuid, post_id: Uuid, at: DateTime<Utc>) {
            let tags = self
                .tags_by_post
                .lock()
                .unwrap()
                .get(&post_id)
                .cloned()
                .unwrap_or_default();
            let mut reads = self.reads.lock().unwrap();
            if reads.iter().any(|(u, p, _, _)| *u == user_id && *p == post_id) {
                return;
            }
            reads.push((user_id, post_id, at, tags));
        }

        fn read_count(&self, user_id: Uuid, post_id: Uuid) -> usize {
            self.reads
                .lock()
                .unwrap()
                .iter()
                .filter(|(u, p, _, _)| *u == user_id && *p == post_id)
                .count()
        }
    }

    #[async_trait]
    impl InteractionStore for InMemoryInteractions {
        async fn recent_reads(
            &self,
            user_id: Uuid,
            limit: u64,
        ) -> Result<Vec<RecentRead>, RepoError> {
            let mut rows: Vec<_> = self
                .reads
                .lock()
                .unwrap()
                .iter()
                .filter(|(u, _, _, _)| *u == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.2.cmp(&a.2));
            rows.truncate(limit as usize);

            Ok(rows
                .into_iter()
                .map(|(_, post_id, _, tags)| RecentRead { post_id, tags })
                .collect())
        }

        async fn record_view(&self, _user_id: Uuid, _post_id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }

        async fn record_read(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
            self.read_at(user_id, post_id, Utc::now());
            Ok(())
        }

        async fn record_like(&self, _user_id: Uuid, _post_id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    fn published(title: &str, tags: &[&str], created_at: DateTime<Utc>) -> Post {
        let mut post = Post::new(
            Uuid::new_v4(),
            title.to_string(),
            format!("{title} content"),
            tags.iter().map(|t| t.to_string()).collect(),
        );
        post.status = PostStatus::Published;
        post.created_at = created_at;
        post.updated_at = created_at;
        post
    }

    fn engine(posts: Arc<InMemoryPosts>, interactions: Arc<InMemoryInteractions>) -> SuggestionEngine {
        SuggestionEngine::new(posts, interactions)
    }

    #[tokio::test]
    async fn test_empty_history_falls_back_to_popular() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let now = Utc::now();

        let a = published("A", &["rust"], now);
        let b = published("B", &["go"], now - Duration::hours(1));
        posts.add_views(a.id, 2);
        posts.insert(a.clone());
        posts.insert(b.clone());

        let engine = engine(posts, interactions);
        let result = engine.suggest(Uuid::new_v4()).await.unwrap();

        assert_eq!(result.kind, SuggestionKind::Popular);
        let popular = engine.popular().await.unwrap();
        let ids: Vec<Uuid> = result.items.iter().map(|p| p.id).collect();
        let popular_ids: Vec<Uuid> = popular.iter().map(|p| p.id).collect();
        assert_eq!(ids, popular_ids);
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_personalized_excludes_read_posts_and_matches_tags() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let user = Uuid::new_v4();
        let now = Utc::now();

        // Two posts already read by the user, three unread with the same tags.
        let read_one = published("Read 1", &["go", "backend"], now - Duration::days(5));
        let read_two = published("Read 2", &["go", "backend"], now - Duration::days(4));
        let unread: Vec<Post> = (0..3)
            .map(|i| {
                published(
                    &format!("Unread {i}"),
                    &["go", "backend"],
                    now - Duration::days(3 - i),
                )
            })
            .collect();

        for post in [&read_one, &read_two].into_iter().chain(unread.iter()) {
            posts.insert(post.clone());
            interactions.register_post(post);
        }
        interactions.read_at(user, read_one.id, now - Duration::days(5));
        interactions.read_at(user, read_two.id, now - Duration::days(4));

        let engine = engine(posts, interactions);
        let result = engine.suggest(user).await.unwrap();

        assert_eq!(result.kind, SuggestionKind::Personalized);
        assert_eq!(result.items.len(), 3);
        // Newest first.
        let titles: Vec<&str> = result.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Unread 2", "Unread 1", "Unread 0"]);
        // Exclusion and tag relevance.
        for post in &result.items {
            assert_ne!(post.id, read_one.id);
            assert_ne!(post.id, read_two.id);
            assert!(post.tags.iter().any(|t| t == "go" || t == "backend"));
        }
    }

    #[tokio::test]
    async fn test_tag_match_but_all_read_falls_back_to_popular() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let user = Uuid::new_v4();
        let now = Utc::now();

        // The only post carrying the user's tags is the one they read.
        let read = published("Only One", &["niche"], now - Duration::days(1));
        let other = published("Unrelated", &["cooking"], now);
        posts.insert(read.clone());
        posts.insert(other.clone());
        interactions.register_post(&read);
        interactions.read_at(user, read.id, now - Duration::days(1));

        let engine = engine(posts, interactions);
        let result = engine.suggest(user).await.unwrap();

        assert_eq!(result.kind, SuggestionKind::Popular);
        let popular_ids: Vec<Uuid> = engine.popular().await.unwrap().iter().map(|p| p.id).collect();
        let ids: Vec<Uuid> = result.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, popular_ids);
    }

    #[tokio::test]
    async fn test_popular_orders_by_views_then_recency() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let now = Utc::now();

        let p1 = published("P1", &["a"], now - Duration::days(3));
        let p2 = published("P2", &["b"], now - Duration::days(2));
        let p3 = published("P3", &["c"], now - Duration::days(1));
        posts.add_views(p1.id, 10);
        posts.add_views(p2.id, 3);
        posts.add_views(p3.id, 3);
        posts.insert(p1.clone());
        posts.insert(p2.clone());
        posts.insert(p3.clone());

        let engine = engine(posts, interactions);
        let result = engine.popular().await.unwrap();

        let ids: Vec<Uuid> = result.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![p1.id, p3.id, p2.id]);
    }

    #[tokio::test]
    async fn test_popular_includes_zero_view_posts_last() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let now = Utc::now();

        let viewed = published("Viewed", &["a"], now - Duration::days(2));
        let unviewed = published("Unviewed", &["b"], now);
        posts.add_views(viewed.id, 1);
        posts.insert(viewed.clone());
        posts.insert(unviewed.clone());

        let engine = engine(posts, interactions);
        let result = engine.popular().await.unwrap();

        let ids: Vec<Uuid> = result.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![viewed.id, unviewed.id]);
    }

    #[tokio::test]
    async fn test_popular_excludes_drafts_and_unpublished() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let now = Utc::now();

        let live = published("Live", &["a"], now);
        let mut draft = published("Draft", &["a"], now);
        draft.status = PostStatus::Draft;
        let mut pulled = published("Pulled", &["a"], now);
        pulled.status = PostStatus::Unpublished;
        posts.add_views(draft.id, 100);
        posts.add_views(pulled.id, 100);
        posts.insert(live.clone());
        posts.insert(draft);
        posts.insert(pulled);

        let engine = engine(posts, interactions);
        let result = engine.popular().await.unwrap();

        let ids: Vec<Uuid> = result.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![live.id]);
    }

    #[tokio::test]
    async fn test_popular_ties_break_deterministically() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let now = Utc::now();

        // Same view count, same timestamp: the post id decides the order.
        let a = published("A", &["t"], now);
        let b = published("B", &["t"], now);
        posts.insert(a);
        posts.insert(b);

        let engine = engine(posts, interactions);
        let first = engine.popular().await.unwrap();
        let second = engine.popular().await.unwrap();

        let first_ids: Vec<Uuid> = first.iter().map(|p| p.id).collect();
        let second_ids: Vec<Uuid> = second.iter().map(|p| p.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_suggest_limits_page_size() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let user = Uuid::new_v4();
        let now = Utc::now();

        let read = published("Seed", &["rust"], now - Duration::days(30));
        posts.insert(read.clone());
        interactions.register_post(&read);
        interactions.read_at(user, read.id, now - Duration::days(30));

        for i in 0..(PAGE_SIZE + 5) {
            posts.insert(published(
                &format!("Post {i}"),
                &["rust"],
                now - Duration::minutes(i as i64),
            ));
        }

        let engine = engine(posts, interactions);
        let result = engine.suggest(user).await.unwrap();

        assert_eq!(result.kind, SuggestionKind::Personalized);
        assert_eq!(result.items.len(), PAGE_SIZE as usize);
    }

    #[tokio::test]
    async fn test_signal_trims_tags_and_collapses_duplicates() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let user = Uuid::new_v4();
        let now = Utc::now();

        let mut read = published("Messy Tags", &[], now - Duration::days(1));
        read.tags = vec![" go ".to_string(), "go".to_string(), "backend".to_string()];
        posts.insert(read.clone());
        interactions.register_post(&read);
        interactions.read_at(user, read.id, now - Duration::days(1));

        let engine = engine(posts, interactions);
        let signal = engine.recent_signal(user).await.unwrap();

        let tags: Vec<&str> = signal.tags.iter().map(|t| t.as_str()).collect();
        assert_eq!(tags, vec!["backend", "go"]);
        assert!(signal.excluded.contains(&read.id));
    }

    #[tokio::test]
    async fn test_signal_uses_only_the_recent_window() {
        let posts = Arc::new(InMemoryPosts::new());
        let interactions = Arc::new(InMemoryInteractions::new());
        let user = Uuid::new_v4();
        let now = Utc::now();

        // Six reads; the oldest one carries a tag that must not survive.
        let stale = published("Stale", &["ancient"], now - Duration::days(10));
        posts.insert(stale.clone());
        interactions.register_post(&stale);
        interactions.read_at(user, stale.id, now - Duration::days(10));

        for i in 0..HISTORY_WINDOW {
            let post = published(&format!("Fresh {i}"), &["fresh"], now - Duration::days(i as i64));
            posts.insert(post.clone());
            interactions.register_post(&post);
            interactions.read_at(user, post.id, now - Duration::days(i as i64));
        }

        let engine = engine(posts, interactions);
        let signal = engine.recent_signal(user).await.unwrap();

        assert!(signal.tags.contains("fresh"));
        assert!(!signal.tags.contains("ancient"));
        assert_eq!(signal.excluded.len(), HISTORY_WINDOW as usize);
    }

    #[tokio::test]
    async fn test_duplicate_read_recording_is_idempotent() {
        let interactions = InMemoryInteractions::new();
        let user = Uuid::new_v4();
        let post = Uuid::new_v4();

        interactions.record_read(user, post).await.unwrap();
        interactions.record_read(user, post).await.unwrap();

        assert_eq!(interactions.read_count(user, post), 1);
    }
}
