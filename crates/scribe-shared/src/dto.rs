//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Request to register a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl RegisterUserRequest {
    /// Check required fields, returning every violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        if self.username.trim().is_empty() {
            errors.push("username must not be empty".to_string());
        }
        if self.password.is_empty() {
            errors.push("password must not be empty".to_string());
        }
        finish(errors)
    }
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.push("password must not be empty".to_string());
        }
        finish(errors)
    }
}

/// Partial update of the authenticated user. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Some(email) = &self.email {
            check_email(email, &mut errors);
        }
        if matches!(&self.username, Some(name) if name.trim().is_empty()) {
            errors.push("username must not be empty".to_string());
        }
        finish(errors)
    }
}

/// Request to attach a profile to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub bio: String,
}

/// Request to create a post. New posts start unpublished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("title must not be empty".to_string());
        }
        finish(errors)
    }
}

/// Partial update of a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            errors.push("title must not be empty".to_string());
        }
        finish(errors)
    }
}

/// Request to comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.body.trim().is_empty() {
            errors.push("body must not be empty".to_string());
        }
        finish(errors)
    }
}

/// Query-string filters for post listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    /// Only posts written by this username.
    pub author: Option<String>,
    /// Only posts favorited by this username.
    pub favorited: Option<String>,
    /// Case-sensitive substring match on title or content.
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStatus {
    pub success: bool,
    pub message: String,
}

fn check_email(email: &str, errors: &mut Vec<String>) {
    if email.is_empty() || !email.contains('@') {
        errors.push("email must be a valid email address".to_string());
    }
}

fn finish(errors: Vec<String>) -> Result<(), Vec<String>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_accepts_short_password() {
        let req = RegisterUserRequest {
            email: "a@x.com".to_string(),
            username: "a".to_string(),
            password: "p".to_string(),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_collects_all_errors() {
        let req = RegisterUserRequest::default();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_update_user_rejects_blank_username() {
        let req = UpdateUserRequest {
            username: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
        assert!(UpdateUserRequest::default().validate().is_ok());
    }

    #[test]
    fn test_list_query_defaults_from_empty_json() {
        let query: ListPostsQuery = serde_json::from_str("{}").unwrap();
        assert!(query.author.is_none());
        assert!(query.limit.is_none());
    }
}
