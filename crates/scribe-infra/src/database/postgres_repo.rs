//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict, Query, SelectStatement};
use sea_orm::{
    ColumnTrait, Condition, DbConn, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use scribe_core::domain::{
    Comment, CommentDetails, Pagination, Post, PostCondition, PostDetails, Profile, User,
};
use scribe_core::error::RepoError;
use scribe_core::ports::{CommentRepository, PostRepository, ProfileRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::favorite::{self, Entity as FavoriteEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::profile::{self, Entity as ProfileEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL profile repository.
pub type PostgresProfileRepository = PostgresBaseRepository<ProfileEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let mut chars = local.chars();
            match (chars.next(), chars.next()) {
                (Some(first), Some(_)) => format!("{first}***@{domain}"),
                _ => format!("***@{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

/// Follower ids for each of `user_ids`.
async fn followers_by_user(
    db: &DbConn,
    user_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<Uuid>>, RepoError> {
    let mut followers: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if user_ids.is_empty() {
        return Ok(followers);
    }

    let rows = FollowEntity::find()
        .filter(follow::Column::FollowingId.is_in(user_ids))
        .all(db)
        .await
        .map_err(repo_err)?;

    for row in rows {
        followers
            .entry(row.following_id)
            .or_default()
            .push(row.follower_id);
    }
    Ok(followers)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Email.eq(email))
                    .add(user::Column::Username.eq(username)),
            )
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn set_following(
        &self,
        follower: Uuid,
        followee: Uuid,
        following: bool,
    ) -> Result<(), RepoError> {
        if following {
            let row = follow::ActiveModel {
                follower_id: Set(follower),
                following_id: Set(followee),
            };
            FollowEntity::insert(row)
                .on_conflict(
                    OnConflict::columns([follow::Column::FollowerId, follow::Column::FollowingId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await
                .map_err(repo_err)?;
        } else {
            FollowEntity::delete_many()
                .filter(follow::Column::FollowerId.eq(follower))
                .filter(follow::Column::FollowingId.eq(followee))
                .exec(&self.db)
                .await
                .map_err(repo_err)?;
        }
        Ok(())
    }

    async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let mut followers = followers_by_user(&self.db, vec![user_id]).await?;
        Ok(followers.remove(&user_id).unwrap_or_default())
    }
}

/// Ids of users whose username equals `username`.
fn user_ids_named(username: &str) -> SelectStatement {
    Query::select()
        .column(user::Column::Id)
        .from(UserEntity)
        .and_where(user::Column::Username.eq(username))
        .to_owned()
}

/// Translate domain conditions into a single `WHERE` clause.
pub(crate) fn to_condition(conditions: &[PostCondition]) -> Condition {
    conditions
        .iter()
        .fold(Condition::all(), |all, condition| match condition {
            PostCondition::Published(published) => all.add(post::Column::Published.eq(*published)),
            PostCondition::AuthorId(id) => all.add(post::Column::AuthorId.eq(*id)),
            PostCondition::AuthorUsername(name) => {
                all.add(post::Column::AuthorId.in_subquery(user_ids_named(name)))
            }
            PostCondition::FavoritedBy(name) => all.add(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(favorite::Column::PostId)
                        .from(FavoriteEntity)
                        .and_where(favorite::Column::UserId.in_subquery(user_ids_named(name)))
                        .to_owned(),
                ),
            ),
            PostCondition::AuthorFollowedBy(id) => all.add(
                post::Column::AuthorId.in_subquery(
                    Query::select()
                        .column(follow::Column::FollowingId)
                        .from(FollowEntity)
                        .and_where(follow::Column::FollowerId.eq(*id))
                        .to_owned(),
                ),
            ),
            PostCondition::Search(needle) => all.add(
                Condition::any()
                    .add(post::Column::Title.contains(needle))
                    .add(post::Column::Content.contains(needle)),
            ),
        })
}

impl PostgresPostRepository {
    /// Attach authors, favorites and author followers to loaded posts.
    async fn load_details(
        &self,
        rows: Vec<(post::Model, Option<user::Model>)>,
    ) -> Result<Vec<PostDetails>, RepoError> {
        let post_ids: Vec<Uuid> = rows.iter().map(|(p, _)| p.id).collect();
        let author_ids: Vec<Uuid> = rows.iter().map(|(p, _)| p.author_id).collect();

        let mut favorites: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        if !post_ids.is_empty() {
            let rows = FavoriteEntity::find()
                .filter(favorite::Column::PostId.is_in(post_ids))
                .all(&self.db)
                .await
                .map_err(repo_err)?;
            for row in rows {
                favorites.entry(row.post_id).or_default().push(row.user_id);
            }
        }
        let followers = followers_by_user(&self.db, author_ids).await?;

        rows.into_iter()
            .map(|(post, author)| {
                let author = author.ok_or_else(|| {
                    RepoError::Query(format!("post {} has no author", post.id))
                })?;
                Ok(PostDetails {
                    favorited_by: favorites.remove(&post.id).unwrap_or_default(),
                    author_followed_by: followers.get(&author.id).cloned().unwrap_or_default(),
                    post: post.into(),
                    author: author.into(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_details(&self, id: Uuid) -> Result<Option<PostDetails>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        match row {
            Some(row) => Ok(self.load_details(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_many(
        &self,
        conditions: &[PostCondition],
        page: Pagination,
    ) -> Result<Vec<PostDetails>, RepoError> {
        let mut query = PostEntity::find()
            .filter(to_condition(conditions))
            .order_by_desc(post::Column::CreatedAt);
        if let Some(skip) = page.skip {
            query = query.offset(skip);
        }
        if let Some(take) = page.take {
            query = query.limit(take);
        }

        let rows = query
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        self.load_details(rows).await
    }

    async fn count(&self, conditions: &[PostCondition]) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(to_condition(conditions))
            .count(&self.db)
            .await
            .map_err(repo_err)
    }

    async fn set_favorite(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        favorited: bool,
    ) -> Result<(), RepoError> {
        if favorited {
            let row = favorite::ActiveModel {
                user_id: Set(user_id),
                post_id: Set(post_id),
            };
            FavoriteEntity::insert(row)
                .on_conflict(
                    OnConflict::columns([favorite::Column::UserId, favorite::Column::PostId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await
                .map_err(repo_err)?;
        } else {
            FavoriteEntity::delete_many()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::PostId.eq(post_id))
                .exec(&self.db)
                .await
                .map_err(repo_err)?;
        }
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let post = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(post.map(Into::into))
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Published, Expr::value(published))
            .col_expr(
                post::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let post = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(post.map(Into::into))
    }

    async fn update_content(
        &self,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Title, Expr::value(title))
            .col_expr(post::Column::Content, Expr::value(content))
            .col_expr(
                post::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let post = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(post.map(Into::into))
    }
}

impl PostgresCommentRepository {
    async fn load_details(
        &self,
        rows: Vec<(comment::Model, Option<user::Model>)>,
    ) -> Result<Vec<CommentDetails>, RepoError> {
        let author_ids: Vec<Uuid> = rows.iter().map(|(c, _)| c.author_id).collect();
        let followers = followers_by_user(&self.db, author_ids).await?;

        rows.into_iter()
            .map(|(comment, author)| {
                let author = author.ok_or_else(|| {
                    RepoError::Query(format!("comment {} has no author", comment.id))
                })?;
                Ok(CommentDetails {
                    author_followed_by: followers.get(&author.id).cloned().unwrap_or_default(),
                    comment: Comment::from(comment),
                    author: author.into(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_details(&self, id: Uuid) -> Result<Option<CommentDetails>, RepoError> {
        let row = CommentEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        match row {
            Some(row) => Ok(self.load_details(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentDetails>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        self.load_details(rows).await
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError> {
        let result = ProfileEntity::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
