/// Business logic layer for blog-service
///
/// `BlogActions` is the set of server actions a page calls:
/// - Reads: users list, recent posts feed, user profile (cached)
/// - Writes: create user, post, comment (validated, then the home page is
///   revalidated and the affected cache tags dropped)
///
/// Collaborators are injected; nothing here owns a connection.
mod comments;
mod posts;
mod users;

use crate::cache::{CacheLayer, QueryCache};
use crate::db::BlogStore;
use cache_invalidation::Revalidator;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Posts returned by `list_posts` when the caller has no preference
pub const DEFAULT_POST_LIMIT: i64 = 5;

/// Page revalidated after every successful write
pub const HOME_PATH: &str = "/";

#[derive(Clone)]
pub struct BlogActions {
    store: Arc<dyn BlogStore>,
    cache: CacheLayer,
    revalidator: Arc<dyn Revalidator>,
}

impl BlogActions {
    pub fn new(
        store: Arc<dyn BlogStore>,
        cache: Arc<dyn QueryCache>,
        revalidator: Arc<dyn Revalidator>,
    ) -> Self {
        Self {
            store,
            cache: CacheLayer::new(cache),
            revalidator,
        }
    }

    pub fn store(&self) -> &Arc<dyn BlogStore> {
        &self.store
    }

    /// Runs once a write has committed. Nothing here can fail the write.
    async fn after_write(&self, tags: Vec<String>) {
        match self.revalidator.revalidate_path(HOME_PATH).await {
            Ok(()) => debug!(path = HOME_PATH, "Revalidated page"),
            Err(e) => warn!(path = HOME_PATH, error = %e, "Page revalidation failed"),
        }

        self.cache.invalidate_tags(&tags).await;
    }
}

/// Caller-supplied identifier; anything that is not a UUID names no row
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}
