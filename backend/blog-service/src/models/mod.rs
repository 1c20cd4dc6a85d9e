/// Data models for blog-service
///
/// This module defines structures for:
/// - User, Post, Comment: rows as stored
/// - Enriched read views (an entity plus the related rows a page renders)
/// - Write payloads, validated before any query runs
pub mod comment;
pub mod post;
pub mod user;

pub use comment::{Comment, CommentWithAuthor, CommentWithRelations, NewComment};
pub use post::{NewPost, Post, PostFeedItem, PostWithAuthor};
pub use user::{
    ActivityCounts, NewUser, User, UserOverview, UserProfile, PROFILE_RECENT_COMMENTS,
};
