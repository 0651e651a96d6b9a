//! Authentication handlers: register, login, profile.

use std::sync::Arc;

use actix_web::{HttpResponse, web};

use quill_core::domain::User;
use quill_core::ports::{PasswordService, TokenService};
use quill_shared::{ApiResponse, AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn to_user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        email: user.email.clone(),
        roles: vec![user.role.clone()],
        created_at: user.created_at.to_rfc3339(),
    }
}

pub async fn register(
    state: web::Data<AppState>,
    passwords: web::Data<Arc<dyn PasswordService>>,
    tokens: web::Data<Arc<dyn TokenService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "A user with email {} already exists",
            req.email
        )));
    }

    let hash = passwords
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state.users.save(User::new(req.email, hash)).await?;

    tracing::info!(user_id = %user.id, "user registered");

    let token = tokens
        .generate_token(user.id, &user.email, vec![user.role.clone()])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expiration_seconds() as u64,
    })))
}

pub async fn login(
    state: web::Data<AppState>,
    passwords: web::Data<Arc<dyn PasswordService>>,
    tokens: web::Data<Arc<dyn TokenService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        tracing::debug!(user_id = %user.id, "login rejected: bad password");
        return Err(AppError::Unauthorized);
    }

    let token = tokens
        .generate_token(user.id, &user.email, vec![user.role.clone()])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expiration_seconds() as u64,
    })))
}

pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_user_response(&user))))
}
