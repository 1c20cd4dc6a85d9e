use super::{parse_id, BlogActions};
use crate::cache::{user_tag, POSTS_LIST_TAG, USERS_LIST_TAG};
use crate::error::{AppError, Entity, Result};
use crate::models::{CommentWithRelations, NewComment};
use tracing::{error, info};
use validator::Validate;

impl BlogActions {
    /// Comment on a post. A missing post is reported before a missing author.
    pub async fn create_comment(&self, input: NewComment) -> Result<CommentWithRelations> {
        input.validate()?;

        let post_id = parse_id(&input.post_id);
        let author_id = parse_id(&input.author_id);

        let find_post = async {
            match post_id {
                Some(id) => self.store.find_post(id).await,
                None => Ok(None),
            }
        };
        let find_author = async {
            match author_id {
                Some(id) => self.store.find_user(id).await,
                None => Ok(None),
            }
        };

        let (post, author) = futures::join!(find_post, find_author);

        let post = post.map_err(|e| {
            error!(post_id = %input.post_id, error = %e, "Failed to look up comment post");
            AppError::CreateFailed("comment")
        })?;
        let author = author.map_err(|e| {
            error!(author_id = %input.author_id, error = %e, "Failed to look up comment author");
            AppError::CreateFailed("comment")
        })?;

        let Some(post) = post else {
            return Err(AppError::NotFound(Entity::Post));
        };
        let Some(author) = author else {
            return Err(AppError::NotFound(Entity::Author));
        };

        let created = self
            .store
            .insert_comment(post.id, author.id, &input.content)
            .await
            .map_err(|e| {
                error!(
                    post_id = %post.id,
                    author_id = %author.id,
                    error = %e,
                    "Failed to create comment"
                );
                AppError::CreateFailed("comment")
            })?;

        info!(
            comment_id = %created.comment.id,
            post_id = %post.id,
            author_id = %author.id,
            "Comment created"
        );

        self.after_write(vec![
            POSTS_LIST_TAG.to_string(),
            USERS_LIST_TAG.to_string(),
            user_tag(&author.id.to_string()),
        ])
        .await;

        Ok(created)
    }
}
