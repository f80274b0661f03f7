//! Response projections. None of these carry credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

/// A user as seen by another user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// Whether the requesting user follows this one.
    pub following: bool,
}

/// A post with viewer-relative flags resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: u64,
    pub author: ProfileData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentData {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: ProfileData,
}

/// A page of posts plus the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsPage<T> {
    pub posts: Vec<T>,
    pub posts_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentList {
    pub comments: Vec<CommentData>,
}
