use crate::models::{Comment, CommentWithAuthor, CommentWithRelations, Post, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct CommentAuthorRow {
    id: Uuid,
    content: String,
    post_id: Uuid,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    author_email: String,
    author_name: Option<String>,
    author_created_at: DateTime<Utc>,
}

impl CommentAuthorRow {
    fn into_comment(self) -> CommentWithAuthor {
        CommentWithAuthor {
            author: User {
                id: self.author_id,
                email: self.author_email,
                name: self.author_name,
                created_at: self.author_created_at,
            },
            comment: Comment {
                id: self.id,
                content: self.content,
                post_id: self.post_id,
                author_id: self.author_id,
                created_at: self.created_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct CreatedCommentRow {
    #[sqlx(flatten)]
    base: CommentAuthorRow,
    post_title: String,
    post_content: Option<String>,
    post_published: bool,
    post_author_id: Uuid,
    post_created_at: DateTime<Utc>,
}

/// Comments (with authors) on any of `post_ids`, newest first
pub async fn list_comments_for_posts(
    pool: &PgPool,
    post_ids: &[Uuid],
) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, CommentAuthorRow>(
        r#"
        SELECT c.id, c.content, c.post_id, c.author_id, c.created_at,
               u.email AS author_email, u.name AS author_name, u.created_at AS author_created_at
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.post_id = ANY($1)
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(post_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CommentAuthorRow::into_comment).collect())
}

/// A user's most recent comments
pub async fn list_recent_comments_by_author(
    pool: &PgPool,
    author_id: Uuid,
    limit: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, content, post_id, author_id, created_at
        FROM comments
        WHERE author_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Create a new comment on a post, returned with its author and post
pub async fn create_comment(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    content: &str,
) -> Result<CommentWithRelations, sqlx::Error> {
    let row = sqlx::query_as::<_, CreatedCommentRow>(
        r#"
        WITH inserted AS (
            INSERT INTO comments (content, post_id, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, post_id, author_id, created_at
        )
        SELECT i.id, i.content, i.post_id, i.author_id, i.created_at,
               u.email AS author_email, u.name AS author_name, u.created_at AS author_created_at,
               p.title AS post_title, p.content AS post_content, p.published AS post_published,
               p.author_id AS post_author_id, p.created_at AS post_created_at
        FROM inserted i
        JOIN users u ON u.id = i.author_id
        JOIN posts p ON p.id = i.post_id
        "#,
    )
    .bind(content)
    .bind(post_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    let post = Post {
        id: row.base.post_id,
        title: row.post_title,
        content: row.post_content,
        published: row.post_published,
        author_id: row.post_author_id,
        created_at: row.post_created_at,
    };
    let CommentWithAuthor { comment, author } = row.base.into_comment();

    Ok(CommentWithRelations {
        comment,
        author,
        post,
    })
}
