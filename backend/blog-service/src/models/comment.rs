use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{Post, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: User,
}

/// A freshly created comment with its author and post attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithRelations {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: User,
    pub post: Post,
}

/// Payload for creating a comment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewComment {
    #[validate(length(min = 1, message = "Content, post, and author are required"))]
    #[serde(default)]
    pub content: String,
    #[validate(length(min = 1, message = "Content, post, and author are required"))]
    #[serde(default)]
    pub post_id: String,
    #[validate(length(min = 1, message = "Content, post, and author are required"))]
    #[serde(default)]
    pub author_id: String,
}

impl NewComment {
    pub fn new(
        content: impl Into<String>,
        post_id: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            post_id: post_id.into(),
            author_id: author_id.into(),
        }
    }
}
