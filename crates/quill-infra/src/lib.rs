//! # Quill Infra
//!
//! Infrastructure implementations for the Quill blog platform: SeaORM
//! repositories over Postgres and the JWT/Argon2 auth services. All
//! public types implement the ports defined in `quill-core`.

pub mod auth;
pub mod database;
