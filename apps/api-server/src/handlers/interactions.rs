//! Interaction recording: views, reads, likes.
//!
//! Read and like submissions are idempotent at the store level; a repeat
//! is a silent no-op and still answers 204. Views are appended every time.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::InteractionKind;
use quill_shared::InteractionRequest;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Record one interaction against a published post.
///
/// Missing or unpublished posts answer 404 before any row is written.
async fn record(
    state: &AppState,
    user_id: Uuid,
    post_id: Uuid,
    kind: InteractionKind,
) -> AppResult<HttpResponse> {
    state
        .posts
        .find_by_id(post_id)
        .await?
        .filter(|p| p.is_published())
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    match kind {
        InteractionKind::View => state.interactions.record_view(user_id, post_id).await?,
        InteractionKind::Read => state.interactions.record_read(user_id, post_id).await?,
        InteractionKind::Like => state.interactions.record_like(user_id, post_id).await?,
    }

    tracing::debug!(
        user_id = %user_id,
        %post_id,
        kind = ?kind,
        idempotent = kind.is_idempotent(),
        "interaction recorded"
    );

    Ok(HttpResponse::NoContent().finish())
}

pub async fn record_view(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<InteractionRequest>,
) -> AppResult<HttpResponse> {
    record(&state, identity.user_id, body.post_id, InteractionKind::View).await
}

pub async fn record_read(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<InteractionRequest>,
) -> AppResult<HttpResponse> {
    record(&state, identity.user_id, body.post_id, InteractionKind::Read).await
}

pub async fn record_like(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<InteractionRequest>,
) -> AppResult<HttpResponse> {
    record(&state, identity.user_id, body.post_id, InteractionKind::Like).await
}
