//! User, follow and profile handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use scribe_shared::dto::{CreateProfileRequest, UpdateUserRequest};

use super::validated;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /users
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let users = state.users.get_all_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /users/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.users.get_user_by_id(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// PATCH /users
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validated(req.validate())?;

    let user = state.users.update_user(identity.user_id, req).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /users/{username}/follow
pub async fn follow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    tracing::debug!(follower = %identity.username, followee = %username, "Follow requested");

    let profile = state
        .users
        .toggle_follow(identity.user_id, &username, true)
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// DELETE /users/{username}/follow
pub async fn unfollow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let profile = state
        .users
        .toggle_follow(identity.user_id, &path.into_inner(), false)
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /users/{id}/profile
pub async fn create_profile(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreateProfileRequest>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    if user_id != identity.user_id {
        return Err(AppError::Forbidden(
            "profiles can only be created for yourself".to_string(),
        ));
    }

    let profile = state
        .users
        .create_profile(user_id, body.into_inner().bio)
        .await?;
    Ok(HttpResponse::Created().json(profile))
}
