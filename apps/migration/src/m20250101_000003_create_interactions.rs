use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_users::Users;
use crate::m20250101_000002_create_posts::Posts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Views: append-only, repeats allowed.
        manager
            .create_table(
                Table::create()
                    .table(PostViews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostViews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostViews::UserId).uuid().not_null())
                    .col(ColumnDef::new(PostViews::PostId).uuid().not_null())
                    .col(
                        ColumnDef::new(PostViews::ViewedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_views_user")
                            .from(PostViews::Table, PostViews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_views_post")
                            .from(PostViews::Table, PostViews::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Popularity counts group by post id.
        manager
            .create_index(
                Index::create()
                    .name("idx_post_views_post_id")
                    .table(PostViews::Table)
                    .col(PostViews::PostId)
                    .to_owned(),
            )
            .await?;

        // Reads: at most one row per (user, post). The unique index is
        // what makes duplicate submissions under concurrency collapse to
        // a single row.
        manager
            .create_table(
                Table::create()
                    .table(PostReads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostReads::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostReads::UserId).uuid().not_null())
                    .col(ColumnDef::new(PostReads::PostId).uuid().not_null())
                    .col(
                        ColumnDef::new(PostReads::ReadAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_reads_user")
                            .from(PostReads::Table, PostReads::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_reads_post")
                            .from(PostReads::Table, PostReads::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_post_reads_user_post")
                    .table(PostReads::Table)
                    .col(PostReads::UserId)
                    .col(PostReads::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Recent-history queries filter by user and order by read time.
        manager
            .create_index(
                Index::create()
                    .name("idx_post_reads_user_read_at")
                    .table(PostReads::Table)
                    .col(PostReads::UserId)
                    .col(PostReads::ReadAt)
                    .to_owned(),
            )
            .await?;

        // Likes: same shape and uniqueness as reads.
        manager
            .create_table(
                Table::create()
                    .table(PostLikes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostLikes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostLikes::UserId).uuid().not_null())
                    .col(ColumnDef::new(PostLikes::PostId).uuid().not_null())
                    .col(
                        ColumnDef::new(PostLikes::LikedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_likes_user")
                            .from(PostLikes::Table, PostLikes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_likes_post")
                            .from(PostLikes::Table, PostLikes::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_post_likes_user_post")
                    .table(PostLikes::Table)
                    .col(PostLikes::UserId)
                    .col(PostLikes::PostId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostLikes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostReads::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostViews::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PostViews {
    Table,
    Id,
    UserId,
    PostId,
    ViewedAt,
}

#[derive(DeriveIden)]
enum PostReads {
    Table,
    Id,
    UserId,
    PostId,
    ReadAt,
}

#[derive(DeriveIden)]
enum PostLikes {
    Table,
    Id,
    UserId,
    PostId,
    LikedAt,
}
