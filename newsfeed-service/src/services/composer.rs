//! Post composer: staged text + images and the submit flow.
//!
//! Submit is create-then-patch: insert the row with no images, upload each
//! staged image one at a time, then patch the row with the uploaded URLs in
//! one write. A failed upload aborts the rest and leaves the row persisted
//! with an empty image list; nothing is retried and nothing rolls back.

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Post, MAX_POST_IMAGES};
use crate::services::backend::NewsfeedBackend;

/// An image staged for upload.
#[derive(Debug, Clone)]
pub struct StagedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Composer state. All mutable input state lives here explicitly: the text,
/// the staged files, their preview handles, and the current inline error.
#[derive(Debug, Default)]
pub struct Composer {
    content: String,
    images: Vec<StagedImage>,
    previews: Vec<String>,
    error: Option<String>,
    submitting: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub fn previews(&self) -> &[String] {
        &self.previews
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the add-images control is enabled.
    pub fn can_add_images(&self) -> bool {
        self.images.len() < MAX_POST_IMAGES
    }

    /// Stage additional images; anything past the cap is silently dropped.
    pub fn add_images(&mut self, files: Vec<StagedImage>) {
        for file in files {
            if self.images.len() >= MAX_POST_IMAGES {
                break;
            }
            self.previews.push(file.file_name.clone());
            self.images.push(file);
        }
    }

    /// Drop one staged image and its preview handle.
    pub fn remove_image(&mut self, index: usize) {
        if index < self.images.len() {
            self.images.remove(index);
            self.previews.remove(index);
        }
    }

    /// Submit the staged post.
    ///
    /// On success all staged state is cleared; on failure it is kept intact
    /// so the user can resubmit, with the error held for inline display.
    pub async fn submit(&mut self, backend: &dyn NewsfeedBackend) -> crate::error::Result<Post> {
        if self.content.trim().is_empty() {
            self.error = Some("Please write something!".to_string());
            return Err(AppError::Validation("post content is empty".to_string()));
        }

        self.submitting = true;
        self.error = None;

        let result = self.run_submit(backend).await;
        self.submitting = false;

        if result.is_ok() {
            self.reset();
        }

        result
    }

    async fn run_submit(&mut self, backend: &dyn NewsfeedBackend) -> crate::error::Result<Post> {
        let content = self.content.trim().to_string();

        let mut post = match backend.insert_post(&content).await {
            Ok(post) => post,
            Err(err) => {
                error!(error = %err, "post insert failed");
                self.error = Some(err.to_string());
                return Err(err);
            }
        };

        if !self.images.is_empty() {
            let urls = match self.upload_images(backend, post.id).await {
                Ok(urls) => urls,
                Err(err) => {
                    error!(error = %err, post_id = %post.id, "image upload failed");
                    self.error = Some("Failed to upload images".to_string());
                    return Err(err);
                }
            };

            if let Err(err) = backend.set_post_images(post.id, &urls).await {
                error!(error = %err, post_id = %post.id, "image url patch failed");
                self.error = Some(err.to_string());
                return Err(err);
            }

            post.image_urls = urls;
        }

        info!(post_id = %post.id, images = post.image_urls.len(), "post created");
        Ok(post)
    }

    /// Upload staged images one at a time, in selection order. Object keys
    /// are derived from the post id, the current time, and the index so they
    /// cannot collide across posts.
    async fn upload_images(
        &self,
        backend: &dyn NewsfeedBackend,
        post_id: Uuid,
    ) -> crate::error::Result<Vec<String>> {
        let mut urls = Vec::with_capacity(self.images.len());

        for (index, image) in self.images.iter().enumerate() {
            let key = format!("{}-{}-{}", post_id, Utc::now().timestamp_millis(), index);
            let url = backend
                .upload_image(&key, image.bytes.clone(), &image.content_type)
                .await?;
            urls.push(url);
        }

        Ok(urls)
    }

    fn reset(&mut self) {
        self.content.clear();
        self.images.clear();
        self.previews.clear();
        self.error = None;
    }
}
