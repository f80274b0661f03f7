//! Authentication handlers.

use actix_web::{HttpResponse, web};

use scribe_shared::dto::{LoginRequest, RegisterUserRequest};

use super::validated;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /signup
///
/// Registration failures are reported in the body rather than as an error.
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validated(req.validate())?;

    let status = state.auth.register(req).await;
    if status.success {
        Ok(HttpResponse::Created().json(status))
    } else {
        Ok(HttpResponse::BadRequest().json(status))
    }
}

/// POST /login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validated(req.validate())?;

    let token = state.auth.login(&req).await?;
    Ok(HttpResponse::Ok().json(token))
}
