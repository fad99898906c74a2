//! Change feed for the posts table, carried over Redis Pub/Sub.
//!
//! Writers publish a small event after every successful row write; each
//! mounted feed holds one long-lived subscription and re-reads the whole
//! collection on every event. Subscribers must treat events purely as
//! invalidation signals: the payload carries an event kind and a post id,
//! but no consumer may rely on them beyond logging.
//!
//! # Example: Publisher
//!
//! ```no_run
//! use change_feed::{ChangePublisher, PostChange};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let publisher = ChangePublisher::new("redis://localhost:6379").await?;
//!     publisher.publish(PostChange::insert(Uuid::new_v4())).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Example: Subscriber
//!
//! ```no_run
//! use change_feed::ChangeSubscriber;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let subscriber = ChangeSubscriber::new("redis://localhost:6379").await?;
//!     let handle = subscriber
//!         .subscribe(|_change| async move {
//!             // invalidate and refetch, ignoring the payload
//!         })
//!         .await?;
//!     handle.await?;
//!     Ok(())
//! }
//! ```

use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

mod error;

pub use error::ChangeFeedError;

type Result<T> = std::result::Result<T, ChangeFeedError>;

/// Kind of row change that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "insert"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// A single change to the posts table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostChange {
    pub kind: ChangeKind,
    pub post_id: Uuid,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

impl PostChange {
    pub fn insert(post_id: Uuid) -> Self {
        Self::with_kind(ChangeKind::Insert, post_id)
    }

    pub fn update(post_id: Uuid) -> Self {
        Self::with_kind(ChangeKind::Update, post_id)
    }

    pub fn delete(post_id: Uuid) -> Self {
        Self::with_kind(ChangeKind::Delete, post_id)
    }

    fn with_kind(kind: ChangeKind, post_id: Uuid) -> Self {
        Self {
            kind,
            post_id,
            occurred_at: chrono::Utc::now(),
        }
    }
}

/// Publisher half of the change feed.
#[derive(Clone)]
pub struct ChangePublisher {
    conn: ConnectionManager,
    channel: String,
}

impl ChangePublisher {
    /// Default Redis channel for post changes
    pub const DEFAULT_CHANNEL: &'static str = "posts:changes";

    /// Create a publisher on the default channel.
    pub async fn new(redis_url: &str) -> Result<Self> {
        Self::with_channel(redis_url, Self::DEFAULT_CHANNEL.to_string()).await
    }

    /// Create a publisher with a custom channel.
    pub async fn with_channel(redis_url: &str, channel: String) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn, channel })
    }

    /// Publish one change event.
    ///
    /// Returns the number of subscribers that received the event.
    pub async fn publish(&self, change: PostChange) -> Result<usize> {
        let payload = serde_json::to_string(&change)?;

        let mut conn = self.conn.clone();
        let receivers: usize = conn.publish(&self.channel, payload).await?;

        debug!(
            kind = %change.kind,
            post_id = %change.post_id,
            receivers,
            "published post change"
        );

        Ok(receivers)
    }
}

/// Subscriber half of the change feed.
pub struct ChangeSubscriber {
    client: Client,
    channel: String,
}

impl ChangeSubscriber {
    /// Create a subscriber on the default channel.
    pub async fn new(redis_url: &str) -> Result<Self> {
        Self::with_channel(redis_url, ChangePublisher::DEFAULT_CHANNEL.to_string()).await
    }

    /// Create a subscriber with a custom channel.
    pub async fn with_channel(redis_url: &str, channel: String) -> Result<Self> {
        let client = Client::open(redis_url)?;

        Ok(Self { client, channel })
    }

    /// Subscribe and invoke `callback` for every change event.
    ///
    /// Returns the JoinHandle of the background task holding the
    /// subscription; dropping or aborting it tears the subscription down.
    pub async fn subscribe<F, Fut>(self, callback: F) -> Result<JoinHandle<()>>
    where
        F: Fn(PostChange) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;

        info!(channel = %self.channel, "subscribed to post changes");

        let callback = Arc::new(callback);

        let handle = tokio::spawn(async move {
            let mut stream = pubsub.on_message();

            while let Some(msg) = stream.next().await {
                let payload = match msg.get_payload::<String>() {
                    Ok(p) => p,
                    Err(e) => {
                        error!(error = ?e, "failed to read change event payload");
                        continue;
                    }
                };

                let change: PostChange = match serde_json::from_str(&payload) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(error = ?e, "ignoring malformed change event");
                        continue;
                    }
                };

                callback(change).await;
            }

            info!("post change stream closed");
        });

        Ok(handle)
    }
}
