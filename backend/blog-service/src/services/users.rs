use super::{parse_id, BlogActions};
use crate::cache::{user_profile_key, user_tag, users_list_key, CacheStrategy, USERS_LIST_TAG};
use crate::db::StoreError;
use crate::error::{AppError, Entity, Result};
use crate::models::{NewUser, User, UserOverview, UserProfile};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

impl BlogActions {
    /// Every user, newest first, with their posts and activity counts
    pub async fn list_users(&self) -> Result<Vec<UserOverview>> {
        let store = Arc::clone(&self.store);

        self.cache
            .read_through(&users_list_key(), CacheStrategy::users_list(), move || {
                let store = Arc::clone(&store);
                async move { store.list_users().await }
            })
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch users");
                AppError::FetchFailed("users")
            })
    }

    /// One user's profile: posts, recent comments and counts
    pub async fn get_user_by_id(&self, id: &str) -> Result<UserProfile> {
        let Some(user_id) = parse_id(id) else {
            return Err(AppError::NotFound(Entity::User));
        };

        let store = Arc::clone(&self.store);
        let id = user_id.to_string();

        let profile = self
            .cache
            .read_through(
                &user_profile_key(&id),
                CacheStrategy::user_profile(&id),
                move || {
                    let store = Arc::clone(&store);
                    async move { store.find_user_profile(user_id).await }
                },
            )
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to fetch user");
                AppError::FetchFailed("user")
            })?;

        profile.ok_or(AppError::NotFound(Entity::User))
    }

    pub async fn create_user(&self, input: NewUser) -> Result<User> {
        input.validate()?;

        let user = self
            .store
            .insert_user(&input.email, input.name.as_deref())
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation { .. } => AppError::DuplicateEmail,
                other => {
                    error!(error = %other, "Failed to create user");
                    AppError::CreateFailed("user")
                }
            })?;

        info!(user_id = %user.id, "User created");

        self.after_write(vec![USERS_LIST_TAG.to_string(), user_tag(&user.id.to_string())])
            .await;

        Ok(user)
    }
}
