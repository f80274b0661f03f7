//! Service-layer behavior against the in-memory repositories.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use scribe_core::domain::{Pagination, Post, PostCondition, PostDetails};
use scribe_core::error::RepoError;
use scribe_core::ports::{BaseRepository, PasswordService, PostRepository, TokenService};
use scribe_core::{AuthService, DomainError, PostService, UserService};
use scribe_infra::database::{
    InMemoryCommentRepository, InMemoryPostRepository, InMemoryProfileRepository,
    InMemoryUserRepository, MemoryStore,
};
use scribe_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};
use scribe_shared::dto::{
    CreateCommentRequest, CreatePostRequest, ListPostsQuery, LoginRequest, RegisterUserRequest,
    UpdatePostRequest, UpdateUserRequest,
};

struct Services {
    users: Arc<UserService>,
    posts: PostService,
    auth: AuthService,
    tokens: Arc<JwtTokenService>,
}

fn services() -> Services {
    let store = MemoryStore::new();
    let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
    let tokens = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret".to_string(),
        ..JwtConfig::default()
    }));

    let users = Arc::new(UserService::new(
        Arc::new(InMemoryUserRepository::new(store.clone())),
        Arc::new(InMemoryProfileRepository::new(store.clone())),
        passwords.clone(),
    ));
    let posts = PostService::new(
        Arc::new(InMemoryPostRepository::new(store.clone())),
        Arc::new(InMemoryCommentRepository::new(store)),
        users.clone(),
    );
    let auth = AuthService::new(users.clone(), tokens.clone(), passwords);

    Services {
        users,
        posts,
        auth,
        tokens,
    }
}

fn register_request(email: &str, username: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        email: email.to_string(),
        username: username.to_string(),
        password: "p".to_string(),
        ..Default::default()
    }
}

async fn user(s: &Services, name: &str) -> Uuid {
    s.users
        .create_user(register_request(&format!("{name}@x.com"), name))
        .await
        .unwrap()
        .id
}

async fn published_post(s: &Services, author: &str, title: &str) -> Uuid {
    let author_id = s.users.get_user_by_email(&format!("{author}@x.com")).await.unwrap().id;
    let post = s
        .posts
        .create(
            &format!("{author}@x.com"),
            CreatePostRequest {
                title: title.to_string(),
                content: format!("{title} body"),
            },
        )
        .await
        .unwrap();
    s.posts.publish(author_id, post.id).await.unwrap();
    post.id
}

#[tokio::test]
async fn test_create_user_rejects_taken_email_or_username() {
    let s = services();
    user(&s, "alice").await;

    for (email, username) in [
        ("alice@x.com", "someone-else"),
        ("other@x.com", "alice"),
        ("alice@x.com", "alice"),
    ] {
        let result = s.users.create_user(register_request(email, username)).await;
        assert!(
            matches!(result, Err(DomainError::AlreadyExists(_))),
            "{email}/{username} should collide"
        );
    }
}

#[tokio::test]
async fn test_created_user_has_hashed_password() {
    let s = services();
    let id = user(&s, "alice").await;

    let stored = s.users.find_user(id).await.unwrap();

    assert_ne!(stored.password_hash, "p");
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_register_reports_failure_instead_of_erroring() {
    let s = services();

    let first = s.auth.register(register_request("a@x.com", "a")).await;
    let second = s.auth.register(register_request("a@x.com", "a")).await;

    assert!(first.success);
    assert!(!second.success);
    assert!(second.message.contains("already exists"));
}

#[tokio::test]
async fn test_login_issues_token_for_matching_password() {
    let s = services();
    let id = user(&s, "alice").await;

    let response = s
        .auth
        .login(&LoginRequest {
            email: "alice@x.com".to_string(),
            password: "p".to_string(),
        })
        .await
        .unwrap();

    let claims = s.tokens.validate_token(&response.access_token).unwrap();
    assert_eq!(claims.user_id, id);
    assert_eq!(claims.email, "alice@x.com");
    assert_eq!(response.token_type, "Bearer");

    let resolved = s.auth.validate_user(&claims).await.unwrap();
    assert_eq!(resolved.username, "alice");
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_unknown_email() {
    let s = services();
    user(&s, "alice").await;

    let wrong_password = s
        .auth
        .login(&LoginRequest {
            email: "alice@x.com".to_string(),
            password: "nope".to_string(),
        })
        .await;
    let unknown = s
        .auth
        .login(&LoginRequest {
            email: "ghost@x.com".to_string(),
            password: "p".to_string(),
        })
        .await;

    assert!(matches!(wrong_password, Err(DomainError::InvalidCredentials)));
    assert!(matches!(unknown, Err(DomainError::InvalidCredentials)));
}

#[tokio::test]
async fn test_follow_then_unfollow_restores_relation() {
    let s = services();
    let alice = user(&s, "alice").await;
    user(&s, "bob").await;

    let followed = s.users.toggle_follow(alice, "bob", true).await.unwrap();
    assert!(followed.following);
    assert_eq!(followed.username, "bob");

    let unfollowed = s.users.toggle_follow(alice, "bob", false).await.unwrap();
    assert!(!unfollowed.following);

    let again = s.users.toggle_follow(alice, "bob", false).await.unwrap();
    assert!(!again.following);
}

#[tokio::test]
async fn test_follow_unknown_user_is_not_found() {
    let s = services();
    let alice = user(&s, "alice").await;

    let result = s.users.toggle_follow(alice, "nobody", true).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_update_user_rejects_taken_username() {
    let s = services();
    let alice = user(&s, "alice").await;
    user(&s, "bob").await;

    let result = s
        .users
        .update_user(
            alice,
            UpdateUserRequest {
                username: Some("bob".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::AlreadyExists(_))));

    let updated = s
        .users
        .update_user(
            alice,
            UpdateUserRequest {
                bio: Some("hello".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.bio.as_deref(), Some("hello"));
    assert_eq!(updated.username, "alice");
}

#[tokio::test]
async fn test_profile_is_one_to_one() {
    let s = services();
    let alice = user(&s, "alice").await;

    let profile = s.users.create_profile(alice, "bio".to_string()).await.unwrap();
    assert_eq!(profile.user_id, alice);

    let second = s.users.create_profile(alice, "again".to_string()).await;
    assert!(matches!(second, Err(DomainError::AlreadyExists(_))));

    let missing = s.users.create_profile(Uuid::new_v4(), "x".to_string()).await;
    assert!(matches!(missing, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_views_increment_by_one() {
    let s = services();
    user(&s, "alice").await;
    let post = published_post(&s, "alice", "Hello").await;

    let mut last = 0;
    for expected in 1..=3 {
        let viewed = s.posts.views(post).await.unwrap();
        assert_eq!(viewed.view_count, expected);
        assert!(viewed.view_count > last);
        last = viewed.view_count;
    }

    assert!(matches!(
        s.posts.views(Uuid::new_v4()).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_find_all_filters_by_favorited_username() {
    let s = services();
    user(&s, "alice").await;
    let bob = user(&s, "bob").await;
    let liked = published_post(&s, "alice", "Liked").await;
    published_post(&s, "alice", "Ignored").await;

    s.posts.favorite(bob, liked).await.unwrap();

    let page = s
        .posts
        .find_all(
            Some(bob),
            &ListPostsQuery {
                favorited: Some("bob".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.posts_count, 1);
    assert_eq!(page.posts.len(), 1);
    assert_eq!(page.posts[0].id, liked);
    assert!(page.posts[0].favorited);
}

#[tokio::test]
async fn test_find_all_hides_drafts_and_filters_by_author() {
    let s = services();
    let alice = user(&s, "alice").await;
    user(&s, "bob").await;
    published_post(&s, "alice", "A1").await;
    published_post(&s, "bob", "B1").await;
    s.posts
        .create(
            "alice@x.com",
            CreatePostRequest {
                title: "Draft".to_string(),
                content: String::new(),
            },
        )
        .await
        .unwrap();

    let all = s.posts.find_all(None, &ListPostsQuery::default()).await.unwrap();
    assert_eq!(all.posts_count, 2);

    let by_alice = s
        .posts
        .find_all(
            None,
            &ListPostsQuery {
                author: Some("alice".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_alice.posts.len(), 1);
    assert_eq!(by_alice.posts[0].title, "A1");

    let drafts = s.posts.get_drafts(alice, alice).await.unwrap();
    assert_eq!(drafts.posts_count, 1);
    assert_eq!(drafts.posts[0].title, "Draft");
}

#[tokio::test]
async fn test_feed_contains_followed_authors_only() {
    let s = services();
    let alice = user(&s, "alice").await;
    user(&s, "bob").await;
    user(&s, "carol").await;
    published_post(&s, "bob", "From Bob").await;
    published_post(&s, "carol", "From Carol").await;

    s.users.toggle_follow(alice, "bob", true).await.unwrap();

    let feed = s.posts.find_feed(alice, &ListPostsQuery::default()).await.unwrap();

    assert_eq!(feed.posts_count, 1);
    assert_eq!(feed.posts[0].title, "From Bob");
    assert!(feed.posts[0].author.following);
}

#[tokio::test]
async fn test_publish_toggles_and_requires_owner() {
    let s = services();
    let alice = user(&s, "alice").await;
    let bob = user(&s, "bob").await;
    let post = s
        .posts
        .create(
            "alice@x.com",
            CreatePostRequest {
                title: "Toggle".to_string(),
                content: String::new(),
            },
        )
        .await
        .unwrap();
    assert!(!post.published);

    assert!(s.posts.publish(alice, post.id).await.unwrap().published);
    assert!(!s.posts.publish(alice, post.id).await.unwrap().published);
    assert!(matches!(
        s.posts.publish(bob, post.id).await,
        Err(DomainError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_update_and_delete_post() {
    let s = services();
    let alice = user(&s, "alice").await;
    let post = published_post(&s, "alice", "Old").await;

    let updated = s
        .posts
        .update(
            alice,
            post,
            UpdatePostRequest {
                title: Some("New".to_string()),
                content: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "New");
    assert_eq!(updated.content, "Old body");

    s.posts.delete(alice, post).await.unwrap();
    assert!(matches!(
        s.posts.find_one(None, post).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_comments_lifecycle() {
    let s = services();
    let alice = user(&s, "alice").await;
    let bob = user(&s, "bob").await;
    let post = published_post(&s, "alice", "Discuss").await;

    let comment = s
        .posts
        .add_comment(
            bob,
            post,
            CreateCommentRequest {
                body: "Nice".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(comment.author.username, "bob");

    let listed = s.posts.find_comments(Some(alice), post).await.unwrap();
    assert_eq!(listed.comments.len(), 1);

    assert!(matches!(
        s.posts.delete_comment(alice, post, comment.id).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        s.posts.delete_comment(bob, Uuid::new_v4(), comment.id).await,
        Err(DomainError::NotFound { .. })
    ));
    s.posts.delete_comment(bob, post, comment.id).await.unwrap();

    let listed = s.posts.find_comments(None, post).await.unwrap();
    assert!(listed.comments.is_empty());
}

#[tokio::test]
async fn test_unfavorite_clears_flag() {
    let s = services();
    user(&s, "alice").await;
    let bob = user(&s, "bob").await;
    let post = published_post(&s, "alice", "Fav").await;

    let favorited = s.posts.favorite(bob, post).await.unwrap();
    assert!(favorited.favorited);
    assert_eq!(favorited.favorites_count, 1);

    let cleared = s.posts.unfavorite(bob, post).await.unwrap();
    assert!(!cleared.favorited);
    assert_eq!(cleared.favorites_count, 0);
}

/// Counts one view just before every content edit lands.
struct ViewDuringEdit(InMemoryPostRepository);

#[async_trait]
impl BaseRepository<Post, Uuid> for ViewDuringEdit {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.0.find_by_id(id).await
    }

    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        self.0.create(post).await
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        self.0.increment_views(post.id).await?;
        self.0.update(post).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.0.delete(id).await
    }
}

#[async_trait]
impl PostRepository for ViewDuringEdit {
    async fn find_details(&self, id: Uuid) -> Result<Option<PostDetails>, RepoError> {
        self.0.find_details(id).await
    }

    async fn find_many(
        &self,
        conditions: &[PostCondition],
        page: Pagination,
    ) -> Result<Vec<PostDetails>, RepoError> {
        self.0.find_many(conditions, page).await
    }

    async fn count(&self, conditions: &[PostCondition]) -> Result<u64, RepoError> {
        self.0.count(conditions).await
    }

    async fn set_favorite(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        favorited: bool,
    ) -> Result<(), RepoError> {
        self.0.set_favorite(user_id, post_id, favorited).await
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.0.increment_views(id).await
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<Option<Post>, RepoError> {
        self.0.set_published(id, published).await
    }

    async fn update_content(
        &self,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Post>, RepoError> {
        self.0.increment_views(id).await?;
        self.0.update_content(id, title, content).await
    }
}

#[tokio::test]
async fn test_edit_keeps_views_counted_meanwhile() {
    let store = MemoryStore::new();
    let users = Arc::new(UserService::new(
        Arc::new(InMemoryUserRepository::new(store.clone())),
        Arc::new(InMemoryProfileRepository::new(store.clone())),
        Arc::new(Argon2PasswordService::new()),
    ));
    let posts = PostService::new(
        Arc::new(ViewDuringEdit(InMemoryPostRepository::new(store.clone()))),
        Arc::new(InMemoryCommentRepository::new(store)),
        users.clone(),
    );
    let alice = users
        .create_user(register_request("alice@x.com", "alice"))
        .await
        .unwrap()
        .id;
    let post = posts
        .create(
            "alice@x.com",
            CreatePostRequest {
                title: "Draft".to_string(),
                content: "Body".to_string(),
            },
        )
        .await
        .unwrap();
    posts.publish(alice, post.id).await.unwrap();

    let edited = posts
        .update(
            alice,
            post.id,
            UpdatePostRequest {
                title: Some("Edited".to_string()),
                content: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.title, "Edited");
    assert_eq!(edited.content, "Body");
    assert_eq!(edited.view_count, 1);
    assert!(edited.published);
}
