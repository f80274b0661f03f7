//! Application state - shared across all handlers.

use std::sync::Arc;

use scribe_core::ports::{
    CommentRepository, PasswordService, PostRepository, ProfileRepository, TokenService,
    UserRepository,
};
use scribe_core::{AuthService, PostService, UserService};
use scribe_infra::database::{
    InMemoryCommentRepository, InMemoryPostRepository, InMemoryProfileRepository,
    InMemoryUserRepository, MemoryStore,
};
use scribe_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

use crate::config::AppConfig;

#[cfg(feature = "postgres")]
use scribe_infra::database::{
    PostgresCommentRepository, PostgresPostRepository, PostgresProfileRepository,
    PostgresUserRepository, connect,
};
#[cfg(feature = "postgres")]
use scribe_infra::DatabaseConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub posts: Arc<PostService>,
    pub auth: Arc<AuthService>,
}

/// One implementation per repository port.
struct Repositories {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new(store.clone())),
            posts: Arc::new(InMemoryPostRepository::new(store.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(store.clone())),
            profiles: Arc::new(InMemoryProfileRepository::new(store)),
        }
    }

    #[cfg(feature = "postgres")]
    async fn postgres(config: &DatabaseConfig, migrate: bool) -> Result<Self, sea_orm::DbErr> {
        use migration::MigratorTrait;

        let db = connect(config).await?;
        if migrate {
            migration::Migrator::up(&db, None).await?;
            tracing::info!("Database schema up to date");
        }

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db.clone())),
            profiles: Arc::new(PostgresProfileRepository::new(db)),
        })
    }
}

impl AppState {
    /// Build the application state, falling back to the in-memory store when
    /// no database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let jwt = config.jwt.clone();

        #[cfg(feature = "postgres")]
        let repos = match &config.database {
            Some(db_config) => {
                match Repositories::postgres(db_config, config.run_migrations).await {
                    Ok(repos) => repos,
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        Repositories::in_memory()
                    }
                }
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Repositories::in_memory()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            if config.database.is_some() {
                tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
            }
            Repositories::in_memory()
        };

        let state = Self::from_parts(repos, jwt);
        tracing::info!("Application state initialized");
        state
    }

    /// State backed by a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory(jwt: JwtConfig) -> Self {
        Self::from_parts(Repositories::in_memory(), jwt)
    }

    fn from_parts(repos: Repositories, jwt: JwtConfig) -> Self {
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(jwt));

        let users = Arc::new(UserService::new(
            repos.users,
            repos.profiles,
            passwords.clone(),
        ));
        let posts = Arc::new(PostService::new(repos.posts, repos.comments, users.clone()));
        let auth = Arc::new(AuthService::new(users.clone(), tokens, passwords));

        Self { users, posts, auth }
    }
}
