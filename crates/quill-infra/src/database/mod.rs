//! Database connection management and SeaORM repositories.

mod connections;

pub mod entity;

mod interactions;
mod post_repo;
mod user_repo;

pub use connections::{DatabaseConfig, connect};
pub use sea_orm::DbErr;
pub use interactions::SeaOrmInteractionStore;
pub use post_repo::SeaOrmPostRepository;
pub use user_repo::SeaOrmUserRepository;


/// Map a SeaORM error to the core repository error, classifying
/// unique-constraint violations.
pub(crate) fn map_query_err(e: sea_orm::DbErr) -> quill_core::error::RepoError {
    use quill_core::error::RepoError;

    let msg = e.to_string();
    if msg.contains("duplicate") || msg.contains("unique") {
        RepoError::Constraint(msg)
    } else {
        RepoError::Query(msg)
    }
}
