//! Backend client binding.
//!
//! One configured handle to the hosted services this application is a
//! client of: the Postgres row store, the S3 object store, and the Redis
//! change feed. The binding owns connection handles and nothing else.
//!
//! Writes publish a change event after they succeed so every subscribed
//! feed refetches; subscribers never inspect the payload.

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use change_feed::{ChangePublisher, PostChange};

use crate::config::StorageConfig;
use crate::db::post_repo;
use crate::error::Result;
use crate::models::{Comment, Post, SortMode};
use crate::services::storage;

/// Operations the newsfeed needs from its hosted backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsfeedBackend: Send + Sync {
    /// Insert a new post row and return it.
    async fn insert_post(&self, content: &str) -> Result<Post>;

    /// Read the whole post collection with the requested ordering.
    async fn list_posts(&self, sort: SortMode) -> Result<Vec<Post>>;

    /// Replace a post's image URL sequence.
    async fn set_post_images(&self, post_id: Uuid, urls: &[String]) -> Result<()>;

    /// Overwrite a post's like count with a client-computed value.
    async fn set_post_likes(&self, post_id: Uuid, likes: i32) -> Result<()>;

    /// Overwrite a post's comment sequence.
    async fn set_post_comments(&self, post_id: Uuid, comments: &[Comment]) -> Result<()>;

    /// Delete a post row. Returns whether a row existed.
    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;

    /// Upload one image and return its public URL.
    async fn upload_image(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String>;
}

/// Production backend over Postgres, S3, and the Redis change feed.
pub struct HostedBackend {
    pool: PgPool,
    s3: S3Client,
    storage: StorageConfig,
    changes: ChangePublisher,
}

impl HostedBackend {
    pub fn new(
        pool: PgPool,
        s3: S3Client,
        storage: StorageConfig,
        changes: ChangePublisher,
    ) -> Self {
        Self {
            pool,
            s3,
            storage,
            changes,
        }
    }

    /// Change events are a courtesy signal; a publish failure must not fail
    /// the write that already committed.
    async fn publish(&self, change: PostChange) {
        if let Err(err) = self.changes.publish(change).await {
            warn!(error = %err, "failed to publish post change");
        }
    }
}

#[async_trait]
impl NewsfeedBackend for HostedBackend {
    async fn insert_post(&self, content: &str) -> Result<Post> {
        let post = post_repo::insert_post(&self.pool, content).await?;
        self.publish(PostChange::insert(post.id)).await;
        Ok(post)
    }

    async fn list_posts(&self, sort: SortMode) -> Result<Vec<Post>> {
        Ok(post_repo::list_posts(&self.pool, sort).await?)
    }

    async fn set_post_images(&self, post_id: Uuid, urls: &[String]) -> Result<()> {
        post_repo::update_image_urls(&self.pool, post_id, urls).await?;
        self.publish(PostChange::update(post_id)).await;
        Ok(())
    }

    async fn set_post_likes(&self, post_id: Uuid, likes: i32) -> Result<()> {
        post_repo::update_likes(&self.pool, post_id, likes).await?;
        self.publish(PostChange::update(post_id)).await;
        Ok(())
    }

    async fn set_post_comments(&self, post_id: Uuid, comments: &[Comment]) -> Result<()> {
        post_repo::update_comments(&self.pool, post_id, comments).await?;
        self.publish(PostChange::update(post_id)).await;
        Ok(())
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let deleted = post_repo::delete_post(&self.pool, post_id).await?;
        if deleted {
            self.publish(PostChange::delete(post_id)).await;
        }
        Ok(deleted)
    }

    async fn upload_image(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        storage::upload_image(&self.s3, &self.storage, key, bytes, content_type).await
    }
}
