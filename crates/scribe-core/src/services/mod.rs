//! Service layer - wraps repositories, shapes projections and raises domain errors.

mod auth;
mod post;
mod user;

pub use auth::AuthService;
pub use post::PostService;
pub use user::{UserService, profile_data};

use crate::error::{DomainError, RepoError};

/// Turn a unique-key violation into an already-exists error.
fn conflict(err: RepoError, what: &str) -> DomainError {
    match err {
        RepoError::Constraint(_) => DomainError::AlreadyExists(what.to_string()),
        other => DomainError::Repository(other),
    }
}
