use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use scribe_shared::dto::{RegisterUserRequest, UpdateUserRequest};
use scribe_shared::projection::{ProfileData, UserData};

use crate::domain::{Profile, User};
use crate::error::DomainError;
use crate::ports::{PasswordService, ProfileRepository, UserRepository};

use super::conflict;

/// User accounts, follows and profiles.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    passwords: Arc<dyn PasswordService>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            users,
            profiles,
            passwords,
        }
    }

    pub async fn get_all_users(&self) -> Result<Vec<UserData>, DomainError> {
        let users = self.users.find_all().await?;
        Ok(users.iter().map(user_data).collect())
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<UserData, DomainError> {
        self.find_user(id).await.map(|user| user_data(&user))
    }

    /// Full entity lookup, password hash included. Not for responses.
    pub async fn find_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    /// Full entity lookup, password hash included. Not for responses.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, DomainError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("User", email))
    }

    pub async fn create_user(&self, req: RegisterUserRequest) -> Result<UserData, DomainError> {
        if self
            .users
            .find_by_email_or_username(&req.email, &req.username)
            .await?
            .is_some()
        {
            return Err(DomainError::AlreadyExists("User".to_string()));
        }

        let password_hash = self.passwords.hash(&req.password)?;

        let mut user = User::new(req.email, req.username, password_hash);
        user.first_name = req.first_name;
        user.last_name = req.last_name;
        user.bio = req.bio;

        let saved = self
            .users
            .create(user)
            .await
            .map_err(|e| conflict(e, "User"))?;

        tracing::info!(user_id = %saved.id, username = %saved.username, "User created");
        Ok(user_data(&saved))
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        changes: UpdateUserRequest,
    ) -> Result<UserData, DomainError> {
        let mut user = self.find_user(id).await?;

        if let Some(email) = changes.email {
            if email != user.email && self.users.find_by_email(&email).await?.is_some() {
                return Err(DomainError::AlreadyExists("Email".to_string()));
            }
            user.email = email;
        }
        if let Some(username) = changes.username {
            if username != user.username && self.users.find_by_username(&username).await?.is_some()
            {
                return Err(DomainError::AlreadyExists("Username".to_string()));
            }
            user.username = username;
        }
        if changes.first_name.is_some() {
            user.first_name = changes.first_name;
        }
        if changes.last_name.is_some() {
            user.last_name = changes.last_name;
        }
        if changes.bio.is_some() {
            user.bio = changes.bio;
        }
        user.updated_at = Utc::now();

        let saved = self
            .users
            .update(user)
            .await
            .map_err(|e| conflict(e, "User"))?;
        Ok(user_data(&saved))
    }

    /// Follow (`add = true`) or unfollow `username` on behalf of `user_id`.
    ///
    /// The returned flag reflects the relation as stored after the change.
    pub async fn toggle_follow(
        &self,
        user_id: Uuid,
        username: &str,
        add: bool,
    ) -> Result<ProfileData, DomainError> {
        let target = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))?;

        if target.id == user_id {
            return Err(DomainError::Validation("cannot follow yourself".to_string()));
        }

        self.users.set_following(user_id, target.id, add).await?;
        tracing::debug!(follower = %user_id, followee = %target.id, add, "Follow relation updated");

        let followers = self.users.followers_of(target.id).await?;
        Ok(profile_data(&target, &followers, Some(user_id)))
    }

    pub async fn create_profile(&self, user_id: Uuid, bio: String) -> Result<Profile, DomainError> {
        self.find_user(user_id).await?;

        if self.profiles.find_by_user_id(user_id).await?.is_some() {
            return Err(DomainError::AlreadyExists("Profile".to_string()));
        }

        self.profiles
            .create(Profile::new(user_id, bio))
            .await
            .map_err(|e| conflict(e, "Profile"))
    }
}

fn user_data(user: &User) -> UserData {
    UserData {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        bio: user.bio.clone(),
    }
}

/// Project `user` as seen by `viewer`; anonymous viewers follow nobody.
pub fn profile_data(user: &User, followed_by: &[Uuid], viewer: Option<Uuid>) -> ProfileData {
    ProfileData {
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        bio: user.bio.clone(),
        following: viewer.is_some_and(|id| followed_by.contains(&id)),
    }
}
