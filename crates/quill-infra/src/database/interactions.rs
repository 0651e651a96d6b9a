//! SeaORM interaction store.
//!
//! Read and like inserts go through `ON CONFLICT DO NOTHING` against the
//! unique (user_id, post_id) index, so the idempotency invariant holds
//! even under concurrent submissions. Views are appended unconditionally.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DbConn, EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use quill_core::domain::RecentRead;
use quill_core::error::RepoError;
use quill_core::ports::InteractionStore;

use super::entity::post_like;
use super::entity::post_read;
use super::entity::post_tag;
use super::entity::post_view;
use super::map_query_err;

pub struct SeaOrmInteractionStore {
    db: DbConn,
}

impl SeaOrmInteractionStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InteractionStore for SeaOrmInteractionStore {
    async fn recent_reads(&self, user_id: Uuid, limit: u64) -> Result<Vec<RecentRead>, RepoError> {
        let reads = post_read::Entity::find()
            .filter(post_read::Column::UserId.eq(user_id))
            .order_by_desc(post_read::Column::ReadAt)
            .order_by_desc(post_read::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_query_err)?;

        if reads.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = reads.iter().map(|r| r.post_id).collect();
        let tag_rows = post_tag::Entity::find()
            .filter(post_tag::Column::PostId.is_in(post_ids))
            .all(&self.db)
            .await
            .map_err(map_query_err)?;

        let mut tags_by_post: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in tag_rows {
            tags_by_post.entry(row.post_id).or_default().push(row.tag);
        }

        Ok(reads
            .into_iter()
            .map(|r| RecentRead {
                post_id: r.post_id,
                tags: tags_by_post.remove(&r.post_id).unwrap_or_default(),
            })
            .collect())
    }

    async fn record_view(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let view = post_view::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            post_id: Set(post_id),
            viewed_at: Set(Utc::now().into()),
        };

        post_view::Entity::insert(view)
            .exec(&self.db)
            .await
            .map_err(map_query_err)?;

        Ok(())
    }

    async fn record_read(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let read = post_read::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            post_id: Set(post_id),
            read_at: Set(Utc::now().into()),
        };

        // Conflict on the unique (user_id, post_id) index is a no-op.
        post_read::Entity::insert(read)
            .on_conflict(
                OnConflict::columns([post_read::Column::UserId, post_read::Column::PostId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await
            .map_err(map_query_err)?;

        Ok(())
    }

    async fn record_like(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let like = post_like::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            post_id: Set(post_id),
            liked_at: Set(Utc::now().into()),
        };

        post_like::Entity::insert(like)
            .on_conflict(
                OnConflict::columns([post_like::Column::UserId, post_like::Column::PostId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await
            .map_err(map_query_err)?;

        Ok(())
    }
}
