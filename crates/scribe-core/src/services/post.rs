use std::sync::Arc;

use uuid::Uuid;

use scribe_shared::dto::{
    CreateCommentRequest, CreatePostRequest, ListPostsQuery, UpdatePostRequest,
};
use scribe_shared::projection::{CommentData, CommentList, PostData, PostsPage};

use crate::domain::{Comment, CommentDetails, Pagination, Post, PostCondition, PostDetails};
use crate::error::DomainError;
use crate::ports::{CommentRepository, PostRepository};

use super::{UserService, profile_data};

/// Posts, comments and favorites.
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<UserService>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        users: Arc<UserService>,
    ) -> Self {
        Self {
            posts,
            comments,
            users,
        }
    }

    /// Translate the optional listing filters into conditions that are AND-ed.
    pub fn build_find_all_query(query: &ListPostsQuery) -> Vec<PostCondition> {
        let mut conditions = Vec::new();

        if let Some(author) = &query.author {
            conditions.push(PostCondition::AuthorUsername(author.clone()));
        }
        if let Some(favorited) = &query.favorited {
            conditions.push(PostCondition::FavoritedBy(favorited.clone()));
        }
        if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
            conditions.push(PostCondition::Search(search.clone()));
        }

        conditions
    }

    /// Replace raw relation id lists with flags relative to `viewer`.
    pub fn map_dynamic_values(viewer: Option<Uuid>, details: PostDetails) -> PostData {
        let PostDetails {
            post,
            author,
            favorited_by,
            author_followed_by,
        } = details;

        PostData {
            id: post.id,
            title: post.title,
            content: post.content,
            published: post.published,
            view_count: post.view_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
            favorited: viewer.is_some_and(|id| favorited_by.contains(&id)),
            favorites_count: favorited_by.len() as u64,
            author: profile_data(&author, &author_followed_by, viewer),
        }
    }

    pub async fn find_all(
        &self,
        viewer: Option<Uuid>,
        query: &ListPostsQuery,
    ) -> Result<PostsPage<PostData>, DomainError> {
        let mut conditions = vec![PostCondition::Published(true)];
        conditions.extend(Self::build_find_all_query(query));

        self.page(viewer, &conditions, pagination(query)).await
    }

    /// Published posts by authors the viewer follows.
    pub async fn find_feed(
        &self,
        viewer: Uuid,
        query: &ListPostsQuery,
    ) -> Result<PostsPage<PostData>, DomainError> {
        let conditions = [
            PostCondition::Published(true),
            PostCondition::AuthorFollowedBy(viewer),
        ];

        self.page(Some(viewer), &conditions, pagination(query)).await
    }

    pub async fn find_one(&self, viewer: Option<Uuid>, id: Uuid) -> Result<PostData, DomainError> {
        let details = self.details(id).await?;
        Ok(Self::map_dynamic_values(viewer, details))
    }

    pub async fn find_comments(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
    ) -> Result<CommentList, DomainError> {
        self.existing(post_id).await?;

        let comments = self.comments.find_by_post(post_id).await?;
        Ok(CommentList {
            comments: comments
                .into_iter()
                .map(|c| comment_data(viewer, c))
                .collect(),
        })
    }

    pub async fn add_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        req: CreateCommentRequest,
    ) -> Result<CommentData, DomainError> {
        self.existing(post_id).await?;

        let comment = self
            .comments
            .create(Comment::new(post_id, user_id, req.body))
            .await?;
        let details = self
            .comments
            .find_details(comment.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", comment.id))?;

        Ok(comment_data(Some(user_id), details))
    }

    pub async fn delete_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        id: Uuid,
    ) -> Result<(), DomainError> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("Comment", id))?;

        if comment.author_id != user_id {
            return Err(DomainError::Forbidden(
                "only the author may delete a comment".to_string(),
            ));
        }

        self.comments.delete(id).await?;
        Ok(())
    }

    pub async fn favorite(&self, user_id: Uuid, id: Uuid) -> Result<PostData, DomainError> {
        self.set_favorite(user_id, id, true).await
    }

    pub async fn unfavorite(&self, user_id: Uuid, id: Uuid) -> Result<PostData, DomainError> {
        self.set_favorite(user_id, id, false).await
    }

    /// Create a draft authored by the user holding `author_email`.
    pub async fn create(
        &self,
        author_email: &str,
        req: CreatePostRequest,
    ) -> Result<PostData, DomainError> {
        let author = self.users.get_user_by_email(author_email).await?;

        let post = self
            .posts
            .create(Post::new(author.id, req.title, req.content))
            .await?;
        tracing::info!(post_id = %post.id, author_id = %author.id, "Post created");

        self.find_one(Some(author.id), post.id).await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: UpdatePostRequest,
    ) -> Result<PostData, DomainError> {
        let post = self.owned(user_id, id).await?;

        let title = req.title.unwrap_or(post.title);
        let content = req.content.unwrap_or(post.content);
        self.posts
            .update_content(id, title, content)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        self.find_one(Some(user_id), id).await
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        self.owned(user_id, id).await?;
        self.posts.delete(id).await?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Count one view. The increment happens inside the store.
    pub async fn views(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .increment_views(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    /// Flip the published flag.
    ///
    /// Read-then-write: two concurrent toggles of the same post may both read
    /// the same state.
    pub async fn publish(&self, user_id: Uuid, id: Uuid) -> Result<PostData, DomainError> {
        let post = self.owned(user_id, id).await?;

        self.posts
            .set_published(id, !post.published)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        self.find_one(Some(user_id), id).await
    }

    /// Unpublished posts of `author_id`, visible to that author only.
    pub async fn get_drafts(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<PostsPage<Post>, DomainError> {
        if user_id != author_id {
            return Err(DomainError::Forbidden(
                "drafts are visible to their author only".to_string(),
            ));
        }

        let conditions = [
            PostCondition::Published(false),
            PostCondition::AuthorId(author_id),
        ];
        let posts = self
            .posts
            .find_many(&conditions, Pagination::default())
            .await?;
        let posts_count = self.posts.count(&conditions).await?;

        Ok(PostsPage {
            posts: posts.into_iter().map(|d| d.post).collect(),
            posts_count,
        })
    }

    async fn page(
        &self,
        viewer: Option<Uuid>,
        conditions: &[PostCondition],
        page: Pagination,
    ) -> Result<PostsPage<PostData>, DomainError> {
        let posts = self.posts.find_many(conditions, page).await?;
        let posts_count = self.posts.count(conditions).await?;

        Ok(PostsPage {
            posts: posts
                .into_iter()
                .map(|details| Self::map_dynamic_values(viewer, details))
                .collect(),
            posts_count,
        })
    }

    async fn set_favorite(
        &self,
        user_id: Uuid,
        id: Uuid,
        favorited: bool,
    ) -> Result<PostData, DomainError> {
        self.existing(id).await?;
        self.posts.set_favorite(user_id, id, favorited).await?;
        self.find_one(Some(user_id), id).await
    }

    async fn details(&self, id: Uuid) -> Result<PostDetails, DomainError> {
        self.posts
            .find_details(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    async fn existing(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    async fn owned(&self, user_id: Uuid, id: Uuid) -> Result<Post, DomainError> {
        let post = self.existing(id).await?;
        if post.author_id != user_id {
            return Err(DomainError::Forbidden(
                "only the author may modify a post".to_string(),
            ));
        }
        Ok(post)
    }
}

fn pagination(query: &ListPostsQuery) -> Pagination {
    Pagination {
        take: query.limit,
        skip: query.offset,
    }
}

fn comment_data(viewer: Option<Uuid>, details: CommentDetails) -> CommentData {
    let CommentDetails {
        comment,
        author,
        author_followed_by,
    } = details;

    CommentData {
        id: comment.id,
        body: comment.body,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        author: profile_data(&author, &author_followed_by, viewer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;

    fn details(favorited_by: Vec<Uuid>, author_followed_by: Vec<Uuid>) -> PostDetails {
        let author = User::new(
            "author@example.com".to_string(),
            "author".to_string(),
            "hash".to_string(),
        );
        PostDetails {
            post: Post::new(author.id, "Title".to_string(), "Body".to_string()),
            author,
            favorited_by,
            author_followed_by,
        }
    }

    #[test]
    fn test_build_query_without_filters_is_empty() {
        let conditions = PostService::build_find_all_query(&ListPostsQuery::default());
        assert!(conditions.is_empty());
    }

    #[test]
    fn test_build_query_combines_filters() {
        let query = ListPostsQuery {
            author: Some("alice".to_string()),
            favorited: Some("bob".to_string()),
            search: Some(String::new()),
            ..Default::default()
        };

        let conditions = PostService::build_find_all_query(&query);

        assert_eq!(
            conditions,
            vec![
                PostCondition::AuthorUsername("alice".to_string()),
                PostCondition::FavoritedBy("bob".to_string()),
            ]
        );
    }

    #[test]
    fn test_map_dynamic_values_for_member_viewer() {
        let viewer = Uuid::new_v4();
        let other = Uuid::new_v4();

        let data = PostService::map_dynamic_values(
            Some(viewer),
            details(vec![other, viewer], vec![viewer]),
        );

        assert!(data.favorited);
        assert_eq!(data.favorites_count, 2);
        assert!(data.author.following);
        assert_eq!(data.author.username, "author");
    }

    #[test]
    fn test_map_dynamic_values_for_anonymous_viewer() {
        let someone = Uuid::new_v4();

        let data = PostService::map_dynamic_values(None, details(vec![someone], vec![someone]));

        assert!(!data.favorited);
        assert!(!data.author.following);
        assert_eq!(data.favorites_count, 1);
    }
}
