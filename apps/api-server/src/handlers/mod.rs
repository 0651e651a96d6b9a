//! HTTP request handlers.

pub mod auth;
pub mod health;
pub mod interactions;
pub mod posts;
pub mod suggestions;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_published))
                    .route("", web::post().to(posts::create))
                    .route("/search", web::get().to(posts::search))
                    .route("/all", web::get().to(posts::list_all))
                    .route("/{id}", web::get().to(posts::get_by_id))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete))
                    .route("/{id}/status", web::patch().to(posts::update_status)),
            )
            .service(
                web::scope("/interactions")
                    .route("/view", web::post().to(interactions::record_view))
                    .route("/read", web::post().to(interactions::record_read))
                    .route("/like", web::post().to(interactions::record_like)),
            )
            .service(
                web::scope("/suggestions")
                    .route("", web::get().to(suggestions::suggest))
                    .route("/popular", web::get().to(suggestions::popular)),
            ),
    );
}

/// Convert a domain post into its API representation.
pub(crate) fn to_post_response(post: quill_core::domain::Post) -> quill_shared::PostResponse {
    quill_shared::PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        content: post.content,
        tags: post.tags,
        status: post.status.as_str().to_string(),
        view_count: post.view_count,
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}
