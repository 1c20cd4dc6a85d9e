use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{Comment, Post};

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// How many posts and comments a user has written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub posts: i64,
    pub comments: i64,
}

/// Entry of the user directory: the user, all of their posts and activity counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserOverview {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<Post>,
    pub counts: ActivityCounts,
}

/// A single user's page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    /// Newest first
    pub posts: Vec<Post>,
    /// The most recent comments, newest first
    pub recent_comments: Vec<Comment>,
    pub counts: ActivityCounts,
}

/// Number of comments shown on a user profile
pub const PROFILE_RECENT_COMMENTS: i64 = 10;

/// Payload for creating a user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Email is required"))]
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            email: email.into(),
            name: name.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_requires_email() {
        assert!(NewUser::new("", None).validate().is_err());
        assert!(NewUser::new("a@b.test", None).validate().is_ok());
        assert!(NewUser::new("a@b.test", Some("Ada")).validate().is_ok());
    }

    #[test]
    fn test_missing_email_deserializes_as_empty() {
        let payload: NewUser = serde_json::from_str("{}").unwrap();

        assert_eq!(payload.email, "");
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_overview_serializes_flat() {
        let overview = UserOverview {
            user: User {
                id: Uuid::nil(),
                email: "ada@example.com".to_string(),
                name: None,
                created_at: Utc::now(),
            },
            posts: Vec::new(),
            counts: ActivityCounts {
                posts: 2,
                comments: 3,
            },
        };

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["counts"]["posts"], 2);
        assert_eq!(json["counts"]["comments"], 3);

        let back: UserOverview = serde_json::from_value(json).unwrap();
        assert_eq!(back, overview);
    }
}
