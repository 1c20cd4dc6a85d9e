//! Page cache revalidation over Redis Pub/Sub
//!
//! Services that write data publish which rendered pages (by path) went
//! stale. The web tier that owns the page cache subscribes and drops the
//! matching entries.
//!
//! # Architecture
//!
//! ```text
//! blog-service:
//!   1. INSERT INTO posts ...
//!   2. PUBLISH cache:revalidate {"target": {"kind": "path", "path": "/"}, ...}
//!      ↓
//! Redis Pub/Sub (broadcast to all subscribers)
//!      ↓
//! web frontend(s):
//!   3. Receive message
//!   4. Evict the rendered page for "/"
//! ```
//!
//! # Example: Publisher
//!
//! ```no_run
//! use cache_invalidation::{InvalidationPublisher, Revalidator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let publisher = InvalidationPublisher::new(
//!         "redis://localhost:6379",
//!         "blog-service".to_string()
//!     ).await?;
//!
//!     publisher.revalidate_path("/").await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Example: Subscriber
//!
//! ```no_run
//! use cache_invalidation::InvalidationSubscriber;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let subscriber = InvalidationSubscriber::new("redis://localhost:6379").await?;
//!
//!     let handle = subscriber.subscribe(|msg| async move {
//!         println!("Revalidating: {:?}", msg.target);
//!         Ok(())
//!     }).await?;
//!
//!     handle.await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

mod error;
pub mod helpers;

pub use error::InvalidationError;
pub use helpers::{build_cache_key, normalize_path};

pub type Result<T> = std::result::Result<T, InvalidationError>;

/// What a message asks subscribers to drop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidationTarget {
    /// A rendered page, addressed by its URL path
    Path { path: String },
}

/// Cache revalidation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationMessage {
    pub message_id: String,
    pub target: InvalidationTarget,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub source_service: String,
}

impl InvalidationMessage {
    fn new(target: InvalidationTarget, source_service: String) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            target,
            timestamp: chrono::Utc::now(),
            source_service,
        }
    }

    /// Create a page path message; the path is normalized first
    pub fn path(path: &str, source_service: String) -> Result<Self> {
        let path = normalize_path(path)?;
        Ok(Self::new(InvalidationTarget::Path { path }, source_service))
    }
}

/// Something that can mark a rendered page as stale
#[async_trait]
pub trait Revalidator: Send + Sync {
    /// Revalidate the page cached for `path`
    async fn revalidate_path(&self, path: &str) -> Result<()>;
}

/// Publisher for revalidation events
#[derive(Clone)]
pub struct InvalidationPublisher {
    client: ConnectionManager,
    channel: String,
    service_name: String,
}

impl InvalidationPublisher {
    /// Default Redis channel for revalidation
    pub const DEFAULT_CHANNEL: &'static str = "cache:revalidate";

    /// Create new publisher
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `service_name` - Name of the publishing service (e.g., "blog-service")
    pub async fn new(redis_url: &str, service_name: String) -> Result<Self> {
        Self::with_channel(redis_url, service_name, Self::DEFAULT_CHANNEL.to_string()).await
    }

    /// Create publisher with custom channel
    pub async fn with_channel(
        redis_url: &str,
        service_name: String,
        channel: String,
    ) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self::from_manager(connection, service_name, channel))
    }

    /// Build a publisher on an existing connection manager
    pub fn from_manager(client: ConnectionManager, service_name: String, channel: String) -> Self {
        Self {
            client,
            channel,
            service_name,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Publish a message
    ///
    /// Returns number of subscribers that received the message
    pub async fn publish(&self, msg: InvalidationMessage) -> Result<usize> {
        let payload = serde_json::to_string(&msg)?;

        debug!(
            message_id = %msg.message_id,
            target = ?msg.target,
            channel = %self.channel,
            "Publishing revalidation message"
        );

        let mut conn = self.client.clone();
        let subscriber_count: usize = conn.publish(&self.channel, payload).await?;

        info!(
            message_id = %msg.message_id,
            subscribers = subscriber_count,
            "Revalidation message published"
        );

        Ok(subscriber_count)
    }
}

#[async_trait]
impl Revalidator for InvalidationPublisher {
    async fn revalidate_path(&self, path: &str) -> Result<()> {
        let msg = InvalidationMessage::path(path, self.service_name.clone())?;
        self.publish(msg).await?;
        Ok(())
    }
}

/// Revalidator for local development without Redis: validates and logs only
#[derive(Debug, Clone)]
pub struct LogOnlyRevalidator {
    service_name: String,
}

impl LogOnlyRevalidator {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

#[async_trait]
impl Revalidator for LogOnlyRevalidator {
    async fn revalidate_path(&self, path: &str) -> Result<()> {
        let path = normalize_path(path)?;
        info!(
            service = %self.service_name,
            path = %path,
            "Revalidation requested (no publisher configured)"
        );
        Ok(())
    }
}

/// Subscriber for revalidation events
pub struct InvalidationSubscriber {
    client: Client,
    channel: String,
}

impl InvalidationSubscriber {
    /// Create new subscriber on the default channel
    pub async fn new(redis_url: &str) -> Result<Self> {
        Self::with_channel(redis_url, InvalidationPublisher::DEFAULT_CHANNEL.to_string()).await
    }

    /// Create subscriber with custom channel
    pub async fn with_channel(redis_url: &str, channel: String) -> Result<Self> {
        let client = Client::open(redis_url)?;

        Ok(Self { client, channel })
    }

    /// Subscribe to revalidation events with callback
    ///
    /// Returns JoinHandle for background task. Malformed payloads are logged
    /// and skipped.
    pub async fn subscribe<F, Fut>(&self, callback: F) -> Result<JoinHandle<()>>
    where
        F: Fn(InvalidationMessage) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;

        info!(channel = %self.channel, "Subscribed to revalidation events");

        let callback = Arc::new(callback);

        let handle = tokio::spawn(async move {
            let mut stream = pubsub.on_message();

            while let Some(msg) = stream.next().await {
                let payload = match msg.get_payload::<String>() {
                    Ok(p) => p,
                    Err(e) => {
                        error!(error = ?e, "Failed to get message payload");
                        continue;
                    }
                };

                let message: InvalidationMessage = match serde_json::from_str(&payload) {
                    Ok(m) => m,
                    Err(e) => {
                        error!(error = ?e, payload = %payload, "Failed to deserialize message");
                        continue;
                    }
                };

                debug!(
                    message_id = %message.message_id,
                    target = ?message.target,
                    "Received revalidation message"
                );

                let message_id = message.message_id.clone();
                if let Err(e) = callback(message).await {
                    error!(error = ?e, message_id = %message_id, "Callback execution failed");
                }
            }

            warn!("Revalidation subscription ended");
        });

        Ok(handle)
    }

    /// Stop subscription
    pub fn unsubscribe(&self, handle: JoinHandle<()>) {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_message_normalizes() {
        let msg = InvalidationMessage::path("/posts/", "blog-service".to_string()).unwrap();

        assert_eq!(
            msg.target,
            InvalidationTarget::Path {
                path: "/posts".to_string()
            }
        );
        assert_eq!(msg.source_service, "blog-service");
    }

    #[test]
    fn test_path_message_rejects_relative_path() {
        let err = InvalidationMessage::path("posts", "blog-service".to_string()).unwrap_err();
        assert!(matches!(err, InvalidationError::InvalidPath(_)));
    }

    #[test]
    fn test_message_wire_format() {
        let msg = InvalidationMessage::path("/", "blog-service".to_string()).unwrap();
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["target"]["kind"], "path");
        assert_eq!(json["target"]["path"], "/");

        let back: InvalidationMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back.message_id, msg.message_id);
        assert_eq!(back.target, msg.target);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = InvalidationMessage::path("/", "s".into()).unwrap();
        let b = InvalidationMessage::path("/", "s".into()).unwrap();
        assert_ne!(a.message_id, b.message_id);
    }

    #[tokio::test]
    async fn test_log_only_revalidator() {
        let revalidator = LogOnlyRevalidator::new("blog-service");

        assert!(revalidator.revalidate_path("/").await.is_ok());
        assert!(revalidator.revalidate_path("").await.is_err());
    }
}
