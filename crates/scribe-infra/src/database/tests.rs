use sea_orm::{DatabaseBackend, EntityTrait, MockDatabase, MockExecResult, QueryFilter, QueryTrait};
use uuid::Uuid;

use scribe_core::domain::{Post, PostCondition};
use scribe_core::ports::{BaseRepository, PostRepository, UserRepository};

use super::entity::{post, user};
use super::postgres_repo::{PostgresPostRepository, PostgresUserRepository, to_condition};

fn post_model(id: Uuid, author_id: Uuid, view_count: i64) -> post::Model {
    let now = chrono::Utc::now();
    post::Model {
        id,
        author_id,
        title: "Test Post".to_owned(),
        content: "Content".to_owned(),
        published: true,
        view_count,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, author_id, 0)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post: Post = repo.find_by_id(post_id).await.unwrap().unwrap();

    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
}

#[tokio::test]
async fn test_increment_views_returns_updated_post() {
    let post_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results(vec![vec![post_model(post_id, Uuid::new_v4(), 7)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post = repo.increment_views(post_id).await.unwrap().unwrap();
    assert_eq!(post.view_count, 7);
}

#[tokio::test]
async fn test_increment_views_of_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    assert!(repo.increment_views(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_content_leaves_counters_alone() {
    let post_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results(vec![vec![post_model(post_id, Uuid::new_v4(), 3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post = repo
        .update_content(post_id, "New".to_owned(), "Body".to_owned())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.view_count, 3);

    let log = repo.db.into_transaction_log();
    let update = format!("{:?}", log[0]);
    assert!(update.contains("UPDATE"));
    assert!(update.contains(r#""title""#));
    assert!(!update.contains("view_count"));
    assert!(!update.contains("published"));
}

#[tokio::test]
async fn test_find_user_by_username() {
    let now = chrono::Utc::now();
    let id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user::Model {
            id,
            email: "alice@example.com".to_owned(),
            username: "alice".to_owned(),
            password_hash: "hash".to_owned(),
            first_name: Some("Alice".to_owned()),
            last_name: None,
            bio: None,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let user = repo.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.first_name.as_deref(), Some("Alice"));
}

#[test]
fn test_conditions_render_as_and_of_subqueries() {
    let follower = Uuid::new_v4();
    let sql = post::Entity::find()
        .filter(to_condition(&[
            PostCondition::Published(true),
            PostCondition::AuthorUsername("alice".to_string()),
            PostCondition::FavoritedBy("bob".to_string()),
            PostCondition::AuthorFollowedBy(follower),
        ]))
        .build(DatabaseBackend::Postgres)
        .to_string();

    assert!(sql.contains("\"published\" = TRUE"));
    assert!(sql.contains("'alice'"));
    assert!(sql.contains("FROM \"favorites\""));
    assert!(sql.contains("'bob'"));
    assert!(sql.contains("FROM \"follows\""));
    assert_eq!(sql.matches(" AND ").count(), 3);
}
