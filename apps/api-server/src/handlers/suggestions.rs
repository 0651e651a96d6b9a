//! Suggestion and popularity endpoints.

use actix_web::{HttpResponse, web};

use quill_core::suggest::SuggestionKind;
use quill_shared::{PopularResponse, SuggestionsResponse};

use super::to_post_response;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn kind_str(kind: SuggestionKind) -> &'static str {
    match kind {
        SuggestionKind::Personalized => "personalized",
        SuggestionKind::Popular => "popular",
    }
}

/// GET /api/suggestions - personalized feed for the authenticated reader.
pub async fn suggest(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let result = state.suggestions.suggest(identity.user_id).await?;

    Ok(HttpResponse::Ok().json(SuggestionsResponse {
        kind: kind_str(result.kind).to_string(),
        suggestions: result.items.into_iter().map(to_post_response).collect(),
    }))
}

/// GET /api/suggestions/popular - global popularity ranking, public.
pub async fn popular(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.suggestions.popular().await?;

    Ok(HttpResponse::Ok().json(PopularResponse {
        kind: "popular".to_string(),
        blogs: posts.into_iter().map(to_post_response).collect(),
    }))
}
