//! Post, comment and favorite handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use scribe_shared::dto::{
    CreateCommentRequest, CreatePostRequest, ListPostsQuery, UpdatePostRequest,
};

use super::validated;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /posts
pub async fn list(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let page = state.posts.find_all(viewer.user_id(), &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /posts/feed
pub async fn feed(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let page = state.posts.find_feed(identity.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validated(req.validate())?;

    let post = state.posts.create(&identity.email, req).await?;
    Ok(HttpResponse::Created().json(post))
}

/// GET /posts/{id}
pub async fn get(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.find_one(viewer.user_id(), *path).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// PUT /posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validated(req.validate())?;

    let post = state.posts.update(identity.user_id, *path, req).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.posts.delete(identity.user_id, *path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /posts/{id}/comments
pub async fn comments(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comments = state.posts.find_comments(viewer.user_id(), *path).await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// POST /posts/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validated(req.validate())?;

    let comment = state.posts.add_comment(identity.user_id, *path, req).await?;
    Ok(HttpResponse::Created().json(comment))
}

/// DELETE /posts/{post_id}/comments/{id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, id) = path.into_inner();
    state
        .posts
        .delete_comment(identity.user_id, post_id, id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /posts/{id}/favorite
pub async fn favorite(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.favorite(identity.user_id, *path).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /posts/{id}/favorite
pub async fn unfavorite(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.unfavorite(identity.user_id, *path).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// PUT /posts/{id}/views
pub async fn views(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = state.posts.views(*path).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// PUT /posts/{id}/publish
pub async fn publish(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.publish(identity.user_id, *path).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// GET /posts/{id}/drafts
///
/// `{id}` is the author whose drafts are listed.
pub async fn drafts(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let drafts = state.posts.get_drafts(identity.user_id, *path).await?;
    Ok(HttpResponse::Ok().json(drafts))
}
