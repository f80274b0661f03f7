use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentDetails, Pagination, Post, PostCondition, PostDetails, Profile, User,
};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique-key collisions surface as `RepoError::Constraint`.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_all(&self) -> Result<Vec<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Find any user holding either the email or the username.
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, RepoError>;

    /// Add or remove `follower -> followee`. Both directions are idempotent.
    async fn set_following(
        &self,
        follower: Uuid,
        followee: Uuid,
        following: bool,
    ) -> Result<(), RepoError>;

    /// Ids of every user following `user_id`.
    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_details(&self, id: Uuid) -> Result<Option<PostDetails>, RepoError>;

    /// Posts matching every condition, newest first.
    async fn find_many(
        &self,
        conditions: &[PostCondition],
        page: Pagination,
    ) -> Result<Vec<PostDetails>, RepoError>;

    async fn count(&self, conditions: &[PostCondition]) -> Result<u64, RepoError>;

    /// Add or remove a favorite. Both directions are idempotent.
    async fn set_favorite(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        favorited: bool,
    ) -> Result<(), RepoError>;

    /// Increment the view counter in a single store-level statement.
    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    async fn set_published(&self, id: Uuid, published: bool) -> Result<Option<Post>, RepoError>;

    /// Overwrite title and content only; counters and flags are left alone.
    async fn update_content(
        &self,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Post>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    async fn find_details(&self, id: Uuid) -> Result<Option<CommentDetails>, RepoError>;

    /// Comments on a post, newest first.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentDetails>, RepoError>;
}

/// Profile repository.
#[async_trait]
pub trait ProfileRepository: BaseRepository<Profile, Uuid> {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError>;
}
