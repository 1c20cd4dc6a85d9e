use super::{parse_id, BlogActions};
use crate::cache::{posts_list_key, user_tag, CacheStrategy, POSTS_LIST_TAG, USERS_LIST_TAG};
use crate::error::{AppError, Entity, Result};
use crate::models::{NewPost, PostFeedItem, PostWithAuthor};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

impl BlogActions {
    /// The `limit` most recent posts with author and comments
    pub async fn list_posts(&self, limit: i64) -> Result<Vec<PostFeedItem>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let store = Arc::clone(&self.store);
        self.cache
            .read_through(&posts_list_key(limit), CacheStrategy::posts_list(), move || {
                let store = Arc::clone(&store);
                async move { store.list_posts(limit).await }
            })
            .await
            .map_err(|e| {
                error!(limit, error = %e, "Failed to fetch posts");
                AppError::FetchFailed("posts")
            })
    }

    pub async fn create_post(&self, input: NewPost) -> Result<PostWithAuthor> {
        input.validate()?;

        let Some(author_id) = parse_id(&input.author_id) else {
            return Err(AppError::NotFound(Entity::Author));
        };

        let author = self.store.find_user(author_id).await.map_err(|e| {
            error!(author_id = %author_id, error = %e, "Failed to look up post author");
            AppError::CreateFailed("post")
        })?;
        if author.is_none() {
            return Err(AppError::NotFound(Entity::Author));
        }

        let created = self
            .store
            .insert_post(
                author_id,
                &input.title,
                input.content.as_deref(),
                input.published,
            )
            .await
            .map_err(|e| {
                error!(author_id = %author_id, error = %e, "Failed to create post");
                AppError::CreateFailed("post")
            })?;

        info!(post_id = %created.post.id, author_id = %author_id, "Post created");

        self.after_write(vec![
            POSTS_LIST_TAG.to_string(),
            USERS_LIST_TAG.to_string(),
            user_tag(&author_id.to_string()),
        ])
        .await;

        Ok(created)
    }
}
