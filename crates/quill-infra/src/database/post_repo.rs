//! SeaORM post repository.
//!
//! Tag intersection and full-text-ish search are plain relational
//! queries against the `post_tags` join table; no string-built
//! predicates.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DbConn, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::Post;
use quill_core::error::RepoError;
use quill_core::ports::{PostOrder, PostRepository, PublishedFilter};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::post_view;
use super::map_query_err;

pub struct SeaOrmPostRepository {
    db: DbConn,
}

impl SeaOrmPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Tag lists for a set of posts, keyed by post id.
    async fn load_tags(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = PostTagEntity::find()
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
            .order_by_asc(post_tag::Column::Tag)
            .all(&self.db)
            .await
            .map_err(map_query_err)?;

        let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in rows {
            map.entry(row.post_id).or_default().push(row.tag);
        }
        Ok(map)
    }

    async fn attach_tags(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut tags = self.load_tags(&ids).await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let post_tags = tags.remove(&m.id).unwrap_or_default();
                m.into_domain(post_tags)
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for SeaOrmPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_query_err)?;

        match model {
            Some(model) => {
                let tags = self.load_tags(&[model.id]).await?;
                let post_tags = tags.get(&model.id).cloned().unwrap_or_default();
                Ok(Some(model.into_domain(post_tags)))
            }
            None => Ok(None),
        }
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_query_err)?;

        self.attach_tags(models).await
    }

    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_query_err)?;

        self.attach_tags(models).await
    }

    async fn find_published(&self, filter: PublishedFilter) -> Result<Vec<Post>, RepoError> {
        let mut query = PostEntity::find().filter(post::Column::Status.eq(post::Status::Published));

        if !filter.tags_any.is_empty() {
            query = query
                .join(JoinType::InnerJoin, post::Relation::Tags.def())
                .filter(post_tag::Column::Tag.is_in(filter.tags_any))
                .distinct();
        }

        if !filter.exclude_ids.is_empty() {
            query = query.filter(post::Column::Id.is_not_in(filter.exclude_ids));
        }

        query = match filter.order {
            PostOrder::CreatedAtDesc => query
                .order_by_desc(post::Column::CreatedAt)
                .order_by_desc(post::Column::Id),
        };

        let models = query
            .limit(filter.limit)
            .all(&self.db)
            .await
            .map_err(map_query_err)?;

        self.attach_tags(models).await
    }

    async fn count_views_by_post(&self) -> Result<HashMap<Uuid, i64>, RepoError> {
        let rows: Vec<(Uuid, i64)> = post_view::Entity::find()
            .select_only()
            .column(post_view::Column::PostId)
            .column_as(post_view::Column::Id.count(), "view_count")
            .group_by(post_view::Column::PostId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_query_err)?;

        Ok(rows.into_iter().collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Post>, RepoError> {
        let needle = query.trim();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{needle}%");

        let models = PostEntity::find()
            .filter(post::Column::Status.eq(post::Status::Published))
            .join(JoinType::LeftJoin, post::Relation::Tags.def())
            .filter(
                Condition::any()
                    .add(Expr::col((post::Entity, post::Column::Title)).ilike(&pattern))
                    .add(Expr::col((post::Entity, post::Column::Content)).ilike(&pattern))
                    .add(Expr::col((post_tag::Entity, post_tag::Column::Tag)).ilike(&pattern)),
            )
            .distinct()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_query_err)?;

        self.attach_tags(models).await
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let id = post.id;
        let tags = post.tags.clone();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;

        let active: post::ActiveModel = post.into();
        let saved = PostEntity::insert(active)
            .on_conflict(
                OnConflict::column(post::Column::Id)
                    .update_columns([
                        post::Column::Title,
                        post::Column::Content,
                        post::Column::Status,
                        post::Column::ViewCount,
                        post::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&txn)
            .await
            .map_err(map_query_err)?;

        // Replace the tag rows wholesale; the list is small.
        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_query_err)?;

        if !tags.is_empty() {
            let rows = tags.iter().map(|tag| post_tag::ActiveModel {
                post_id: Set(id),
                tag: Set(tag.clone()),
            });
            PostTagEntity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(map_query_err)?;
        }

        txn.commit()
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;

        Ok(saved.into_domain(tags))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
