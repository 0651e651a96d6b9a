//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::SuggestionEngine;
use quill_core::ports::{InteractionStore, PostRepository, UserRepository};
use quill_infra::database::{
    self, DatabaseConfig, DbErr, SeaOrmInteractionStore, SeaOrmPostRepository,
    SeaOrmUserRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub interactions: Arc<dyn InteractionStore>,
    pub suggestions: Arc<SuggestionEngine>,
}

impl AppState {
    /// Connect to the database and wire up repositories and the engine.
    pub async fn new(db_config: &DatabaseConfig) -> Result<Self, DbErr> {
        let db = database::connect(db_config).await?;

        let users: Arc<dyn UserRepository> = Arc::new(SeaOrmUserRepository::new(db.clone()));
        let posts: Arc<dyn PostRepository> = Arc::new(SeaOrmPostRepository::new(db.clone()));
        let interactions: Arc<dyn InteractionStore> =
            Arc::new(SeaOrmInteractionStore::new(db.clone()));
        let suggestions = Arc::new(SuggestionEngine::new(posts.clone(), interactions.clone()));

        tracing::info!("Application state initialized");

        Ok(Self {
            users,
            posts,
            interactions,
            suggestions,
        })
    }
}
