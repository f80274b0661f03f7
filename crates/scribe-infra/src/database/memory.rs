//! In-memory repositories - used when no database is configured, and in tests.
//!
//! All four repositories share one [`MemoryStore`], so relations (authors,
//! follows, favorites) and cascades behave like the SQL schema.
//! Note: Data is lost on process restart.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use scribe_core::domain::{
    Comment, CommentDetails, Pagination, Post, PostCondition, PostDetails, Profile, User,
};
use scribe_core::error::RepoError;
use scribe_core::ports::{
    BaseRepository, CommentRepository, PostRepository, ProfileRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    profiles: Vec<Profile>,
    /// (follower, followee)
    follows: HashSet<(Uuid, Uuid)>,
    /// (user, post)
    favorites: HashSet<(Uuid, Uuid)>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn followers_of(&self, user_id: Uuid) -> Vec<Uuid> {
        self.follows
            .iter()
            .filter(|(_, followee)| *followee == user_id)
            .map(|(follower, _)| *follower)
            .collect()
    }

    fn post_details(&self, post: &Post) -> Result<PostDetails, RepoError> {
        let author = self
            .user(post.author_id)
            .cloned()
            .ok_or_else(|| RepoError::Query(format!("post {} has no author", post.id)))?;

        Ok(PostDetails {
            post: post.clone(),
            favorited_by: self
                .favorites
                .iter()
                .filter(|(_, post_id)| *post_id == post.id)
                .map(|(user_id, _)| *user_id)
                .collect(),
            author_followed_by: self.followers_of(author.id),
            author,
        })
    }

    fn comment_details(&self, comment: &Comment) -> Result<CommentDetails, RepoError> {
        let author = self
            .user(comment.author_id)
            .cloned()
            .ok_or_else(|| RepoError::Query(format!("comment {} has no author", comment.id)))?;

        Ok(CommentDetails {
            comment: comment.clone(),
            author_followed_by: self.followers_of(author.id),
            author,
        })
    }

    fn matching_posts(&self, conditions: &[PostCondition]) -> Result<Vec<PostDetails>, RepoError> {
        let mut matched = Vec::new();
        for post in &self.posts {
            let details = self.post_details(post)?;
            let favorited_names: Vec<&str> = details
                .favorited_by
                .iter()
                .filter_map(|id| self.user(*id))
                .map(|u| u.username.as_str())
                .collect();

            if conditions
                .iter()
                .all(|c| c.matches(&details, &favorited_names))
            {
                matched.push(details);
            }
        }
        matched.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        Ok(matched)
    }

    fn remove_post(&mut self, id: Uuid) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != id);
        if self.posts.len() == before {
            return false;
        }
        self.comments.retain(|c| c.post_id != id);
        self.favorites.retain(|(_, post_id)| *post_id != id);
        true
    }
}

/// Shared backing store for the in-memory repositories.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// In-memory user repository.
pub struct InMemoryUserRepository(Arc<MemoryStore>);

/// In-memory post repository.
pub struct InMemoryPostRepository(Arc<MemoryStore>);

/// In-memory comment repository.
pub struct InMemoryCommentRepository(Arc<MemoryStore>);

/// In-memory profile repository.
pub struct InMemoryProfileRepository(Arc<MemoryStore>);

impl InMemoryUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self(store)
    }
}

impl InMemoryPostRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self(store)
    }
}

impl InMemoryCommentRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self(store)
    }
}

impl InMemoryProfileRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self(store)
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.0.tables.read().await.user(id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id == user.id || u.email == user.email || u.username == user.username)
        {
            return Err(RepoError::Constraint("duplicate user".to_string()));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id != user.id && (u.email == user.email || u.username == user.username))
        {
            return Err(RepoError::Constraint("duplicate user".to_string()));
        }
        let slot = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(RepoError::NotFound);
        }

        let authored: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|c| c.author_id != id);
        tables.profiles.retain(|p| p.user_id != id);
        tables.follows.retain(|(a, b)| *a != id && *b != id);
        tables.favorites.retain(|(user_id, _)| *user_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.0.tables.read().await.users.clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email || u.username == username)
            .cloned())
    }

    async fn set_following(
        &self,
        follower: Uuid,
        followee: Uuid,
        following: bool,
    ) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        if following {
            if tables.user(follower).is_none() || tables.user(followee).is_none() {
                return Err(RepoError::Constraint("unknown user".to_string()));
            }
            tables.follows.insert((follower, followee));
        } else {
            tables.follows.remove(&(follower, followee));
        }
        Ok(())
    }

    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        Ok(self.0.tables.read().await.followers_of(user_id))
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables.user(post.author_id).is_none() {
            return Err(RepoError::Constraint("unknown author".to_string()));
        }
        if tables.posts.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Constraint("duplicate post".to_string()));
        }
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.0.tables.write().await;
        let slot = tables
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.0.tables.write().await.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_details(&self, id: Uuid) -> Result<Option<PostDetails>, RepoError> {
        let tables = self.0.tables.read().await;
        tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.post_details(p))
            .transpose()
    }

    async fn find_many(
        &self,
        conditions: &[PostCondition],
        page: Pagination,
    ) -> Result<Vec<PostDetails>, RepoError> {
        let matched = self.0.tables.read().await.matching_posts(conditions)?;
        let skip = page.skip.unwrap_or(0) as usize;
        let take = page.take.map(|t| t as usize).unwrap_or(usize::MAX);

        Ok(matched.into_iter().skip(skip).take(take).collect())
    }

    async fn count(&self, conditions: &[PostCondition]) -> Result<u64, RepoError> {
        let matched = self.0.tables.read().await.matching_posts(conditions)?;
        Ok(matched.len() as u64)
    }

    async fn set_favorite(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        favorited: bool,
    ) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        if favorited {
            if tables.user(user_id).is_none() || !tables.posts.iter().any(|p| p.id == post_id) {
                return Err(RepoError::Constraint("unknown user or post".to_string()));
            }
            tables.favorites.insert((user_id, post_id));
        } else {
            tables.favorites.remove(&(user_id, post_id));
        }
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let mut tables = self.0.tables.write().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.view_count += 1;
            post.clone()
        }))
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<Option<Post>, RepoError> {
        let mut tables = self.0.tables.write().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.published = published;
            post.updated_at = chrono::Utc::now();
            post.clone()
        }))
    }

    async fn update_content(
        &self,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Post>, RepoError> {
        let mut tables = self.0.tables.write().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.title = title;
            post.content = content;
            post.updated_at = chrono::Utc::now();
            post.clone()
        }))
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables.user(comment.author_id).is_none()
            || !tables.posts.iter().any(|p| p.id == comment.post_id)
        {
            return Err(RepoError::Constraint("unknown author or post".to_string()));
        }
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.0.tables.write().await;
        let slot = tables
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or(RepoError::NotFound)?;
        *slot = comment.clone();
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_details(&self, id: Uuid) -> Result<Option<CommentDetails>, RepoError> {
        let tables = self.0.tables.read().await;
        tables
            .comments
            .iter()
            .find(|c| c.id == id)
            .map(|c| tables.comment_details(c))
            .transpose()
    }

    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentDetails>, RepoError> {
        let tables = self.0.tables.read().await;
        let mut comments = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| tables.comment_details(c))
            .collect::<Result<Vec<_>, _>>()?;
        comments.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));
        Ok(comments)
    }
}

#[async_trait]
impl BaseRepository<Profile, Uuid> for InMemoryProfileRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, profile: Profile) -> Result<Profile, RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables.profiles.iter().any(|p| p.user_id == profile.user_id) {
            return Err(RepoError::Constraint("duplicate profile".to_string()));
        }
        tables.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update(&self, profile: Profile) -> Result<Profile, RepoError> {
        let mut tables = self.0.tables.write().await;
        let slot = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or(RepoError::NotFound)?;
        *slot = profile.clone();
        Ok(profile)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        let before = tables.profiles.len();
        tables.profiles.retain(|p| p.id != id);
        if tables.profiles.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User::new(format!("{name}@example.com"), name.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_constraint_violation() {
        let users = InMemoryUserRepository::new(MemoryStore::new());
        users.create(user("alice")).await.unwrap();

        let mut clash = user("other");
        clash.username = "alice".to_string();

        assert!(matches!(
            users.create(clash).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let users = InMemoryUserRepository::new(MemoryStore::new());
        let a = users.create(user("a")).await.unwrap();
        let b = users.create(user("b")).await.unwrap();

        users.set_following(a.id, b.id, true).await.unwrap();
        users.set_following(a.id, b.id, true).await.unwrap();
        assert_eq!(users.followers_of(b.id).await.unwrap(), vec![a.id]);

        users.set_following(a.id, b.id, false).await.unwrap();
        users.set_following(a.id, b.id, false).await.unwrap();
        assert!(users.followers_of(b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_post_cascades() {
        let store = MemoryStore::new();
        let users = InMemoryUserRepository::new(store.clone());
        let posts = InMemoryPostRepository::new(store.clone());
        let comments = InMemoryCommentRepository::new(store);

        let author = users.create(user("author")).await.unwrap();
        let post = posts
            .create(Post::new(author.id, "t".to_string(), "c".to_string()))
            .await
            .unwrap();
        let comment = comments
            .create(Comment::new(post.id, author.id, "hi".to_string()))
            .await
            .unwrap();
        posts.set_favorite(author.id, post.id, true).await.unwrap();

        posts.delete(post.id).await.unwrap();

        assert!(comments.find_by_id(comment.id).await.unwrap().is_none());
        assert!(posts.find_details(post.id).await.unwrap().is_none());
        assert!(matches!(posts.delete(post.id).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_pagination_windows_newest_first() {
        let store = MemoryStore::new();
        let users = InMemoryUserRepository::new(store.clone());
        let posts = InMemoryPostRepository::new(store);
        let author = users.create(user("author")).await.unwrap();

        for i in 0..5i64 {
            let mut post = Post::new(author.id, format!("post {i}"), String::new());
            post.created_at += chrono::TimeDelta::seconds(i);
            posts.create(post).await.unwrap();
        }

        let page = posts
            .find_many(
                &[],
                Pagination {
                    take: Some(2),
                    skip: Some(1),
                },
            )
            .await
            .unwrap();

        let titles: Vec<_> = page.iter().map(|d| d.post.title.as_str()).collect();
        assert_eq!(titles, vec!["post 3", "post 2"]);
        assert_eq!(posts.count(&[]).await.unwrap(), 5);
    }
}
