use crate::models::{ActivityCounts, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct UserCountsRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
    post_count: i64,
    comment_count: i64,
}

impl UserCountsRow {
    fn split(self) -> (User, ActivityCounts) {
        (
            User {
                id: self.id,
                email: self.email,
                name: self.name,
                created_at: self.created_at,
            },
            ActivityCounts {
                posts: self.post_count,
                comments: self.comment_count,
            },
        )
    }
}

/// All users with their post/comment counts, newest first
pub async fn list_users_with_counts(
    pool: &PgPool,
) -> Result<Vec<(User, ActivityCounts)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserCountsRow>(
        r#"
        SELECT u.id, u.email, u.name, u.created_at,
               (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count,
               (SELECT COUNT(*) FROM comments c WHERE c.author_id = u.id) AS comment_count
        FROM users u
        ORDER BY u.created_at DESC, u.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UserCountsRow::split).collect())
}

/// One user with their post/comment counts
pub async fn find_user_with_counts(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<(User, ActivityCounts)>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserCountsRow>(
        r#"
        SELECT u.id, u.email, u.name, u.created_at,
               (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count,
               (SELECT COUNT(*) FROM comments c WHERE c.author_id = u.id) AS comment_count
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(UserCountsRow::split))
}

/// Get a single user by ID
pub async fn find_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, name, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Insert a user; a taken email fails with the database's unique violation
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, name)
        VALUES ($1, $2)
        RETURNING id, email, name, created_at
        "#,
    )
    .bind(email)
    .bind(name)
    .fetch_one(pool)
    .await
}
