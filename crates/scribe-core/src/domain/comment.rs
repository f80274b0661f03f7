use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// Comment entity - a reply attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: Uuid, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            body,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A comment with its author and the author's followers.
#[derive(Debug, Clone)]
pub struct CommentDetails {
    pub comment: Comment,
    pub author: User,
    pub author_followed_by: Vec<Uuid>,
}
