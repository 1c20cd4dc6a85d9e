use crate::models::{Post, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// A post row joined with its author's columns
#[derive(sqlx::FromRow)]
struct PostAuthorRow {
    id: Uuid,
    title: String,
    content: Option<String>,
    published: bool,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    author_email: String,
    author_name: Option<String>,
    author_created_at: DateTime<Utc>,
}

impl PostAuthorRow {
    fn split(self) -> (Post, User) {
        let author = User {
            id: self.author_id,
            email: self.author_email,
            name: self.author_name,
            created_at: self.author_created_at,
        };
        let post = Post {
            id: self.id,
            title: self.title,
            content: self.content,
            published: self.published,
            author_id: self.author_id,
            created_at: self.created_at,
        };
        (post, author)
    }
}

/// The newest `limit` posts with their authors
pub async fn list_recent_posts_with_authors(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<(Post, User)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PostAuthorRow>(
        r#"
        SELECT p.id, p.title, p.content, p.published, p.author_id, p.created_at,
               u.email AS author_email, u.name AS author_name, u.created_at AS author_created_at
        FROM posts p
        JOIN users u ON u.id = p.author_id
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PostAuthorRow::split).collect())
}

/// All posts written by any of `author_ids`, newest first
pub async fn list_posts_by_authors(
    pool: &PgPool,
    author_ids: &[Uuid],
) -> Result<Vec<Post>, sqlx::Error> {
    if author_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, published, author_id, created_at
        FROM posts
        WHERE author_id = ANY($1)
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(author_ids)
    .fetch_all(pool)
    .await
}

/// Get a single post by ID
pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, published, author_id, created_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Insert a post and return it joined with its author
pub async fn create_post(
    pool: &PgPool,
    author_id: Uuid,
    title: &str,
    content: Option<&str>,
    published: bool,
) -> Result<(Post, User), sqlx::Error> {
    let row = sqlx::query_as::<_, PostAuthorRow>(
        r#"
        WITH inserted AS (
            INSERT INTO posts (title, content, published, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, published, author_id, created_at
        )
        SELECT i.id, i.title, i.content, i.published, i.author_id, i.created_at,
               u.email AS author_email, u.name AS author_name, u.created_at AS author_created_at
        FROM inserted i
        JOIN users u ON u.id = i.author_id
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(published)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    Ok(row.split())
}
