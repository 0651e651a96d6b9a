//! # Quill Core
//!
//! The domain layer of the Quill blog platform.
//! This crate contains pure business logic with zero infrastructure dependencies,
//! including the suggestion engine that ranks posts for a reader.

pub mod domain;
pub mod error;
pub mod ports;
pub mod suggest;

pub use error::DomainError;
pub use suggest::SuggestionEngine;
