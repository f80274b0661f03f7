use std::sync::Arc;

use scribe_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, RegistrationStatus};

use crate::domain::User;
use crate::error::DomainError;
use crate::ports::{AuthError, PasswordService, TokenClaims, TokenService};

use super::UserService;

/// Registration, login and token resolution.
pub struct AuthService {
    users: Arc<UserService>,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserService>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            users,
            tokens,
            passwords,
        }
    }

    /// Register a user. Never fails: any error is folded into the status.
    pub async fn register(&self, req: RegisterUserRequest) -> RegistrationStatus {
        match self.users.create_user(req).await {
            Ok(_) => RegistrationStatus {
                success: true,
                message: "User registered".to_string(),
            },
            Err(err) => {
                tracing::warn!(error = %err, "Registration failed");
                RegistrationStatus {
                    success: false,
                    message: failure_message(&err),
                }
            }
        }
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, DomainError> {
        let user = match self.users.get_user_by_email(&req.email).await {
            Ok(user) => user,
            Err(DomainError::NotFound { .. }) => return Err(DomainError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        if !self.passwords.verify(&req.password, &user.password_hash)? {
            return Err(DomainError::InvalidCredentials);
        }

        let access_token = self.tokens.generate_token(user.id, &user.email)?;
        tracing::debug!(user_id = %user.id, "Issued access token");

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.expiration_seconds().max(0) as u64,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.tokens.validate_token(token)
    }

    /// Resolve the user a token was issued to.
    pub async fn validate_user(&self, claims: &TokenClaims) -> Result<User, AuthError> {
        match self.users.find_user(claims.user_id).await {
            Ok(user) => Ok(user),
            Err(DomainError::NotFound { .. }) => Err(AuthError::UnknownUser),
            Err(e) => Err(AuthError::Unavailable(e.to_string())),
        }
    }
}

/// Client-facing reason for a failed registration; store detail stays in the log.
fn failure_message(err: &DomainError) -> String {
    match err {
        DomainError::Repository(_) | DomainError::Internal(_) => {
            "Registration is temporarily unavailable".to_string()
        }
        other => other.to_string(),
    }
}
