//! SeaORM entities mirroring the migration schema.

pub mod post;
pub mod post_like;
pub mod post_read;
pub mod post_tag;
pub mod post_view;
pub mod user;
