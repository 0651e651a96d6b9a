//! Post CRUD and search handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::{Post, PostStatus};
use quill_core::ports::PublishedFilter;
use quill_shared::{ApiResponse, CreatePostRequest, UpdatePostRequest, UpdateStatusRequest};

use super::to_post_response;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/posts - published posts, newest first.
pub async fn list_published(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.find_published(PublishedFilter::all()).await?;

    let items: Vec<_> = posts.into_iter().map(to_post_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(items)))
}

/// GET /api/posts/search?q= - substring search over published posts.
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest(
            "Query parameter 'q' must not be empty".to_string(),
        ));
    }

    let posts = state.posts.search(q).await?;

    let items: Vec<_> = posts.into_iter().map(to_post_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(items)))
}

/// GET /api/posts/all - every post regardless of status. Admin only.
pub async fn list_all(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden);
    }

    let posts = state.posts.find_all().await?;

    let items: Vec<_> = posts.into_iter().map(to_post_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(items)))
}

/// GET /api/posts/{id} - public detail view.
///
/// Bumps the denormalized view counter; the response reflects the bump
/// without a second fetch.
pub async fn get_by_id(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .filter(|p| p.is_published())
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    state.posts.increment_view_count(id).await?;
    post.view_count += 1;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_post_response(post))))
}

/// POST /api/posts - create a draft.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("Content must not be empty".to_string()));
    }

    let post = state
        .posts
        .save(Post::new(identity.user_id, req.title, req.content, req.tags))
        .await?;

    tracing::info!(post_id = %post.id, author_id = %identity.user_id, "post created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(to_post_response(post))))
}

/// PUT /api/posts/{id} - update title/content/tags. Author or admin.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    if post.author_id != identity.user_id && !identity.is_admin() {
        return Err(AppError::Forbidden);
    }

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Title must not be empty".to_string()));
        }
        post.title = title;
    }
    if let Some(content) = req.content {
        post.content = content;
    }
    if let Some(tags) = req.tags {
        post.set_tags(tags);
    }
    post.updated_at = chrono::Utc::now();

    let post = state.posts.save(post).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_post_response(post))))
}

/// DELETE /api/posts/{id} - author or admin.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    if post.author_id != identity.user_id && !identity.is_admin() {
        return Err(AppError::Forbidden);
    }

    state.posts.delete(id).await?;

    tracing::info!(post_id = %id, "post deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /api/posts/{id}/status - publication workflow. Admin only.
pub async fn update_status(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> AppResult<HttpResponse> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden);
    }

    let id = path.into_inner();
    let status: PostStatus = body
        .status
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    post.status = status;
    post.updated_at = chrono::Utc::now();

    let post = state.posts.save(post).await?;

    tracing::info!(post_id = %id, status = %post.status.as_str(), "post status changed");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_post_response(post))))
}
