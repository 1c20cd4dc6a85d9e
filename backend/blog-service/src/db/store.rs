use super::{comment_repo, post_repo, user_repo, StoreResult};
use crate::models::{
    CommentWithAuthor, CommentWithRelations, Post, PostFeedItem, PostWithAuthor, User,
    UserOverview, UserProfile, PROFILE_RECENT_COMMENTS,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Data access contract used by the services.
///
/// Each method is a single logical query or write. Implementations own how
/// related rows are fetched, but must keep the orderings documented here.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// All users, newest first, each with all posts (newest first) and counts
    async fn list_users(&self) -> StoreResult<Vec<UserOverview>>;

    /// Up to `limit` posts, newest first, each with author and comments (newest first)
    async fn list_posts(&self, limit: i64) -> StoreResult<Vec<PostFeedItem>>;

    /// One user with posts (newest first), recent comments and counts
    async fn find_user_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    async fn find_post(&self, post_id: Uuid) -> StoreResult<Option<Post>>;

    async fn insert_user(&self, email: &str, name: Option<&str>) -> StoreResult<User>;

    async fn insert_post(
        &self,
        author_id: Uuid,
        title: &str,
        content: Option<&str>,
        published: bool,
    ) -> StoreResult<PostWithAuthor>;

    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> StoreResult<CommentWithRelations>;

    /// Round trip to the backing database
    async fn ping(&self) -> StoreResult<()>;
}

/// `BlogStore` over PostgreSQL
#[derive(Clone)]
pub struct PgBlogStore {
    pool: PgPool,
}

impl PgBlogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Group rows by key, keeping each group in the order rows arrived
fn group_by<T>(rows: Vec<T>, key: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut groups: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows {
        groups.entry(key(&row)).or_default().push(row);
    }
    groups
}

#[async_trait]
impl BlogStore for PgBlogStore {
    async fn list_users(&self) -> StoreResult<Vec<UserOverview>> {
        let users = user_repo::list_users_with_counts(&self.pool).await?;
        let ids: Vec<Uuid> = users.iter().map(|(user, _)| user.id).collect();

        let posts = post_repo::list_posts_by_authors(&self.pool, &ids).await?;
        let mut posts_by_author = group_by(posts, |post| post.author_id);

        Ok(users
            .into_iter()
            .map(|(user, counts)| UserOverview {
                posts: posts_by_author.remove(&user.id).unwrap_or_default(),
                user,
                counts,
            })
            .collect())
    }

    async fn list_posts(&self, limit: i64) -> StoreResult<Vec<PostFeedItem>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let posts = post_repo::list_recent_posts_with_authors(&self.pool, limit).await?;
        let ids: Vec<Uuid> = posts.iter().map(|(post, _)| post.id).collect();

        let comments = comment_repo::list_comments_for_posts(&self.pool, &ids).await?;
        let mut comments_by_post =
            group_by(comments, |c: &CommentWithAuthor| c.comment.post_id);

        Ok(posts
            .into_iter()
            .map(|(post, author)| {
                let comments = comments_by_post.remove(&post.id).unwrap_or_default();
                PostFeedItem {
                    comment_count: comments.len() as i64,
                    post,
                    author,
                    comments,
                }
            })
            .collect())
    }

    async fn find_user_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let Some((user, counts)) = user_repo::find_user_with_counts(&self.pool, user_id).await?
        else {
            return Ok(None);
        };

        let posts = post_repo::list_posts_by_authors(&self.pool, &[user_id]).await?;
        let recent_comments = comment_repo::list_recent_comments_by_author(
            &self.pool,
            user_id,
            PROFILE_RECENT_COMMENTS,
        )
        .await?;

        Ok(Some(UserProfile {
            user,
            posts,
            recent_comments,
            counts,
        }))
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(user_repo::find_user_by_id(&self.pool, user_id).await?)
    }

    async fn find_post(&self, post_id: Uuid) -> StoreResult<Option<Post>> {
        Ok(post_repo::find_post_by_id(&self.pool, post_id).await?)
    }

    async fn insert_user(&self, email: &str, name: Option<&str>) -> StoreResult<User> {
        Ok(user_repo::create_user(&self.pool, email, name).await?)
    }

    async fn insert_post(
        &self,
        author_id: Uuid,
        title: &str,
        content: Option<&str>,
        published: bool,
    ) -> StoreResult<PostWithAuthor> {
        let (post, author) =
            post_repo::create_post(&self.pool, author_id, title, content, published).await?;
        Ok(PostWithAuthor { post, author })
    }

    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> StoreResult<CommentWithRelations> {
        Ok(comment_repo::create_comment(&self.pool, post_id, author_id, content).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
