//! In-memory collaborators for blog-service integration tests
//!
//! `InMemoryStore` keeps the same orderings as the PostgreSQL store and counts
//! every call so tests can assert which queries and writes ran.
#![allow(dead_code)]

use async_trait::async_trait;
use blog_service::cache::{CacheResult, CacheStrategy, CachedEntry, MemoryQueryCache, QueryCache};
use blog_service::db::{BlogStore, StoreError, StoreResult};
use blog_service::models::{
    ActivityCounts, Comment, CommentWithAuthor, CommentWithRelations, Post, PostFeedItem,
    PostWithAuthor, User, UserOverview, UserProfile, PROFILE_RECENT_COMMENTS,
};
use blog_service::BlogActions;
use cache_invalidation::{InvalidationError, Revalidator};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    tick: i64,
}

impl Tables {
    /// Strictly increasing timestamps so newest-first ordering is deterministic
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_else(Utc::now)
            + Duration::seconds(self.tick)
    }

    fn user(&self, id: Uuid) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }

    fn counts(&self, user_id: Uuid) -> ActivityCounts {
        ActivityCounts {
            posts: self.posts.iter().filter(|p| p.author_id == user_id).count() as i64,
            comments: self.comments.iter().filter(|c| c.author_id == user_id).count() as i64,
        }
    }

    fn posts_by(&self, user_id: Uuid) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| p.author_id == user_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}

fn simulated_outage() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: &'static str) {
        *self.calls.lock().unwrap().entry(call).or_insert(0) += 1;
    }

    /// Number of times `call` (a `BlogStore` method name) ran
    pub fn calls(&self, call: &str) -> usize {
        self.calls.lock().unwrap().get(call).copied().unwrap_or(0)
    }

    pub fn write_calls(&self) -> usize {
        self.calls("insert_user") + self.calls("insert_post") + self.calls("insert_comment")
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn seed_user(&self, email: &str, name: Option<&str>) -> User {
        let mut tables = self.tables.lock().unwrap();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.map(str::to_string),
            created_at: tables.next_timestamp(),
        };
        tables.users.push(user.clone());
        user
    }

    pub fn seed_post(&self, author: &User, title: &str) -> Post {
        let mut tables = self.tables.lock().unwrap();
        let post = Post {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: None,
            published: false,
            author_id: author.id,
            created_at: tables.next_timestamp(),
        };
        tables.posts.push(post.clone());
        post
    }

    pub fn seed_comment(&self, post: &Post, author: &User, content: &str) -> Comment {
        let mut tables = self.tables.lock().unwrap();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            post_id: post.id,
            author_id: author.id,
            created_at: tables.next_timestamp(),
        };
        tables.comments.push(comment.clone());
        comment
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub fn post_count(&self) -> usize {
        self.tables.lock().unwrap().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.tables.lock().unwrap().comments.len()
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(simulated_outage());
        }
        Ok(())
    }

    fn check_writes(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(simulated_outage());
        }
        Ok(())
    }
}

#[async_trait]
impl BlogStore for InMemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<UserOverview>> {
        self.record("list_users");
        self.check_reads()?;

        let tables = self.tables.lock().unwrap();
        let mut users = tables.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(users
            .into_iter()
            .map(|user| UserOverview {
                posts: tables.posts_by(user.id),
                counts: tables.counts(user.id),
                user,
            })
            .collect())
    }

    async fn list_posts(&self, limit: i64) -> StoreResult<Vec<PostFeedItem>> {
        self.record("list_posts");
        self.check_reads()?;

        let tables = self.tables.lock().unwrap();
        let mut posts = tables.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit.max(0) as usize);

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let author = tables.user(post.author_id)?;
                let mut comments: Vec<CommentWithAuthor> = tables
                    .comments
                    .iter()
                    .filter(|c| c.post_id == post.id)
                    .filter_map(|c| {
                        Some(CommentWithAuthor {
                            author: tables.user(c.author_id)?,
                            comment: c.clone(),
                        })
                    })
                    .collect();
                comments.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));

                Some(PostFeedItem {
                    comment_count: comments.len() as i64,
                    post,
                    author,
                    comments,
                })
            })
            .collect())
    }

    async fn find_user_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        self.record("find_user_profile");
        self.check_reads()?;

        let tables = self.tables.lock().unwrap();
        let Some(user) = tables.user(user_id) else {
            return Ok(None);
        };

        let mut recent_comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.author_id == user_id)
            .cloned()
            .collect();
        recent_comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_comments.truncate(PROFILE_RECENT_COMMENTS as usize);

        Ok(Some(UserProfile {
            posts: tables.posts_by(user_id),
            counts: tables.counts(user_id),
            recent_comments,
            user,
        }))
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        self.record("find_user");
        self.check_reads()?;
        Ok(self.tables.lock().unwrap().user(user_id))
    }

    async fn find_post(&self, post_id: Uuid) -> StoreResult<Option<Post>> {
        self.record("find_post");
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn insert_user(&self, email: &str, name: Option<&str>) -> StoreResult<User> {
        self.record("insert_user");
        self.check_writes()?;

        if self.tables.lock().unwrap().users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation {
                constraint: Some("users_email_key".to_string()),
            });
        }
        Ok(self.seed_user(email, name))
    }

    async fn insert_post(
        &self,
        author_id: Uuid,
        title: &str,
        content: Option<&str>,
        published: bool,
    ) -> StoreResult<PostWithAuthor> {
        self.record("insert_post");
        self.check_writes()?;

        let mut tables = self.tables.lock().unwrap();
        let Some(author) = tables.user(author_id) else {
            return Err(StoreError::ForeignKeyViolation {
                constraint: Some("posts_author_id_fkey".to_string()),
            });
        };

        let post = Post {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.map(str::to_string),
            published,
            author_id,
            created_at: tables.next_timestamp(),
        };
        tables.posts.push(post.clone());

        Ok(PostWithAuthor { post, author })
    }

    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> StoreResult<CommentWithRelations> {
        self.record("insert_comment");
        self.check_writes()?;

        let mut tables = self.tables.lock().unwrap();
        let post = tables.posts.iter().find(|p| p.id == post_id).cloned();
        let (Some(post), Some(author)) = (post, tables.user(author_id)) else {
            return Err(StoreError::ForeignKeyViolation { constraint: None });
        };

        let comment = Comment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            post_id,
            author_id,
            created_at: tables.next_timestamp(),
        };
        tables.comments.push(comment.clone());

        Ok(CommentWithRelations {
            comment,
            author,
            post,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.record("ping");
        self.check_reads()
    }
}

/// Revalidator that remembers every path it was asked to refresh
#[derive(Clone, Default)]
pub struct RecordingRevalidator {
    paths: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls but report a publish failure
    pub fn failing() -> Self {
        let revalidator = Self::default();
        revalidator.fail.store(true, Ordering::SeqCst);
        revalidator
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    pub fn count_for(&self, path: &str) -> usize {
        self.paths.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl Revalidator for RecordingRevalidator {
    async fn revalidate_path(&self, path: &str) -> cache_invalidation::Result<()> {
        self.paths.lock().unwrap().push(path.to_string());

        if self.fail.load(Ordering::SeqCst) {
            return Err(InvalidationError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        Ok(())
    }
}

/// Memory cache that records which tags were invalidated
#[derive(Clone, Default)]
pub struct RecordingCache {
    inner: Arc<MemoryQueryCache>,
    invalidated: Arc<Mutex<Vec<String>>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidated_tags(&self) -> Vec<String> {
        self.invalidated.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryCache for RecordingCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedEntry>> {
        self.inner.get(key).await
    }

    async fn put(
        &self,
        key: &str,
        entry: CachedEntry,
        strategy: &CacheStrategy,
    ) -> CacheResult<()> {
        self.inner.put(key, entry, strategy).await
    }

    async fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize> {
        self.invalidated.lock().unwrap().extend(tags.iter().cloned());
        self.inner.invalidate_tags(tags).await
    }
}

/// Everything a test needs to drive `BlogActions` and inspect the effects
pub struct Harness {
    pub store: InMemoryStore,
    pub revalidator: RecordingRevalidator,
    pub cache: RecordingCache,
    pub actions: BlogActions,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_revalidator(RecordingRevalidator::new())
    }

    pub fn with_revalidator(revalidator: RecordingRevalidator) -> Self {
        let store = InMemoryStore::new();
        let cache = RecordingCache::new();
        let actions = BlogActions::new(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            Arc::new(revalidator.clone()),
        );

        Self {
            store,
            revalidator,
            cache,
            actions,
        }
    }
}
