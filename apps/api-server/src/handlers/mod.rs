//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod users;


use actix_web::{error::JsonPayloadError, web};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        // Auth routes
        .route("/signup", web::post().to(auth::signup))
        .route("/login", web::post().to(auth::login))
        // User routes
        .service(
            web::scope("/users")
                .route("", web::get().to(users::list))
                .route("", web::patch().to(users::update))
                .route("/me", web::get().to(users::me))
                .route("/{username}/follow", web::post().to(users::follow))
                .route("/{username}/follow", web::delete().to(users::unfollow))
                .route("/{id}/profile", web::post().to(users::create_profile)),
        )
        // Post routes; `/feed` must precede `/{id}`
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::list))
                .route("", web::post().to(posts::create))
                .route("/feed", web::get().to(posts::feed))
                .route("/{id}", web::get().to(posts::get))
                .route("/{id}", web::put().to(posts::update))
                .route("/{id}", web::delete().to(posts::delete))
                .route("/{id}/comments", web::get().to(posts::comments))
                .route("/{id}/comments", web::post().to(posts::add_comment))
                .route(
                    "/{post_id}/comments/{id}",
                    web::delete().to(posts::delete_comment),
                )
                .route("/{id}/favorite", web::post().to(posts::favorite))
                .route("/{id}/favorite", web::delete().to(posts::unfavorite))
                .route("/{id}/views", web::put().to(posts::views))
                .route("/{id}/publish", web::put().to(posts::publish))
                .route("/{id}/drafts", web::get().to(posts::drafts)),
        );
}

/// Render malformed JSON bodies as RFC 7807 errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = match &err {
            JsonPayloadError::ContentType => "Expected application/json".to_string(),
            other => other.to_string(),
        };
        AppError::BadRequest(detail).into()
    })
}

/// Turn DTO validation failures into a 422.
fn validated(result: Result<(), Vec<String>>) -> Result<(), AppError> {
    result.map_err(AppError::Validation)
}
