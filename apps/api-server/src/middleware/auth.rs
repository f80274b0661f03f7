//! Authentication extractors.

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, ResponseError,
    dev::Payload,
    http::{StatusCode, header},
    web,
};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use scribe_core::ports::AuthError;
use scribe_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// The bearer token is verified and then resolved against the user store, so
/// a token issued to a since-deleted user is rejected.
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AuthError::Unavailable(_) | AuthError::HashingError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::UnknownUser => ErrorResponse::new(401, "Invalid Token")
                .with_detail("The token's user no longer exists."),
            AuthError::InvalidCredentials => ErrorResponse::unauthorized(),
            AuthError::Unavailable(msg) | AuthError::HashingError(msg) => {
                tracing::error!("Authentication backend failure: {}", msg);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(req: &HttpRequest) -> Result<String, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let token = token.map_err(AuthenticationError)?;
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AuthenticationError(AuthError::Unavailable(
                    "Server configuration error".to_string(),
                )));
            };

            let claims = state
                .auth
                .verify_token(&token)
                .map_err(AuthenticationError)?;
            let user = state
                .auth
                .validate_user(&claims)
                .await
                .map_err(AuthenticationError)?;

            Ok(Identity {
                user_id: user.id,
                email: user.email,
                username: user.username,
            })
        })
    }
}

/// Optional identity extractor.
///
/// Missing or rejected credentials yield an anonymous viewer; a user-store
/// failure still fails the request.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|i| i.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);

        Box::pin(async move {
            match identity.await {
                Ok(identity) => Ok(OptionalIdentity(Some(identity))),
                Err(err) if err.status_code() == StatusCode::UNAUTHORIZED => {
                    Ok(OptionalIdentity(None))
                }
                Err(err) => Err(err),
            }
        })
    }
}
