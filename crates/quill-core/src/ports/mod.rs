//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod interactions;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use interactions::InteractionStore;
pub use repository::{PostOrder, PostRepository, PublishedFilter, UserRepository};
