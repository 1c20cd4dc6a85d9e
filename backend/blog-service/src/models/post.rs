use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{CommentWithAuthor, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A post as rendered on the home page feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostFeedItem {
    #[serde(flatten)]
    pub post: Post,
    pub author: User,
    /// Newest first
    pub comments: Vec<CommentWithAuthor>,
    pub comment_count: i64,
}

/// A freshly created post with its author attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: User,
}

/// Payload for creating a post
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, message = "Title and author are required"))]
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[validate(length(min = 1, message = "Title and author are required"))]
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub published: bool,
}

impl NewPost {
    /// Unpublished post without body
    pub fn new(title: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
            author_id: author_id.into(),
            published: false,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_defaults_to_unpublished() {
        let payload: NewPost =
            serde_json::from_str(r#"{"title":"Hello","author_id":"abc"}"#).unwrap();

        assert!(!payload.published);
        assert_eq!(payload.content, None);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_new_post_requires_title_and_author() {
        assert!(NewPost::new("", "abc").validate().is_err());
        assert!(NewPost::new("Hello", "").validate().is_err());

        let payload: NewPost = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert_eq!(payload.author_id, "");
        assert!(payload.validate().is_err());
    }
}
