use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// Post entity - represents a blog post or article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new, unpublished post.
    pub fn new(author_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            published: false,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A post loaded together with the relations needed to render it.
#[derive(Debug, Clone)]
pub struct PostDetails {
    pub post: Post,
    pub author: User,
    /// Ids of users who favorited the post.
    pub favorited_by: Vec<Uuid>,
    /// Ids of users who follow the author.
    pub author_followed_by: Vec<Uuid>,
}

/// A single filter on post listings. Lists of conditions are AND-ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCondition {
    Published(bool),
    AuthorId(Uuid),
    AuthorUsername(String),
    FavoritedBy(String),
    AuthorFollowedBy(Uuid),
    /// Substring of the title or the content.
    Search(String),
}

impl PostCondition {
    /// Evaluate the condition against loaded details.
    ///
    /// Stores that filter in memory use this; SQL stores translate the
    /// condition into a `WHERE` clause instead. `FavoritedBy` needs the
    /// usernames of the favoriting users, passed via `favorited_names`.
    pub fn matches(&self, details: &PostDetails, favorited_names: &[&str]) -> bool {
        match self {
            PostCondition::Published(published) => details.post.published == *published,
            PostCondition::AuthorId(id) => details.post.author_id == *id,
            PostCondition::AuthorUsername(name) => details.author.username == *name,
            PostCondition::FavoritedBy(name) => favorited_names.contains(&name.as_str()),
            PostCondition::AuthorFollowedBy(id) => details.author_followed_by.contains(id),
            PostCondition::Search(needle) => {
                details.post.title.contains(needle.as_str())
                    || details.post.content.contains(needle.as_str())
            }
        }
    }
}

/// Take/skip window for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub take: Option<u64>,
    pub skip: Option<u64>,
}
