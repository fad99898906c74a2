//! Post handlers: create, like, comment, delete.

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::{redirect_to_page, FeedQuery};
use crate::models::LocalUser;
use crate::render::page::render_page;
use crate::services::backend::NewsfeedBackend;
use crate::services::composer::{Composer, StagedImage};
use crate::services::feed::Feed;

/// Create a post from the composer form (multipart: `content` text plus any
/// number of `images` file fields; the composer truncates past the cap).
///
/// Success refreshes the feed and redirects back to the page. Failure
/// re-renders the page with the inline error and the form state intact.
pub async fn create_post(
    backend: web::Data<Arc<dyn NewsfeedBackend>>,
    feed: web::Data<Arc<RwLock<Feed>>>,
    user: web::Data<LocalUser>,
    query: web::Query<FeedQuery>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut composer = Composer::new();
    read_form(payload, &mut composer).await?;

    match composer.submit(backend.get_ref().as_ref()).await {
        Ok(_post) => {
            feed.write().await.refresh(backend.get_ref().as_ref()).await;
            Ok(redirect_to_page(&query))
        }
        Err(err) => {
            warn!(error = %err, "post submit failed");
            let guard = feed.read().await;
            let html = render_page(&guard, &user, &composer, query.is_admin());
            Ok(HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(html))
        }
    }
}

async fn read_form(mut payload: Multipart, composer: &mut Composer) -> Result<()> {
    let mut staged = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("invalid form payload: {e}")))?;

        let (name, file_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or("").to_string(),
                cd.get_filename().unwrap_or("image").to_string(),
            ),
            None => (String::new(), "image".to_string()),
        };
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "content" => composer.set_content(String::from_utf8_lossy(&data).into_owned()),
            "images" => {
                // Browsers submit an empty file field when nothing is picked.
                if !data.is_empty() {
                    staged.push(StagedImage {
                        file_name,
                        content_type,
                        bytes: data,
                    });
                }
            }
            _ => {}
        }
    }

    composer.add_images(staged);
    Ok(())
}

/// Increment a post's like count by one.
pub async fn like_post(
    backend: web::Data<Arc<dyn NewsfeedBackend>>,
    feed: web::Data<Arc<RwLock<Feed>>>,
    path: web::Path<Uuid>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    feed.write()
        .await
        .like(backend.get_ref().as_ref(), *path)
        .await?;

    Ok(redirect_to_page(&query))
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub content: String,
}

/// Append a comment to a post.
pub async fn add_comment(
    backend: web::Data<Arc<dyn NewsfeedBackend>>,
    feed: web::Data<Arc<RwLock<Feed>>>,
    path: web::Path<Uuid>,
    query: web::Query<FeedQuery>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    feed.write()
        .await
        .add_comment(backend.get_ref().as_ref(), *path, &form.content)
        .await?;

    Ok(redirect_to_page(&query))
}

/// Toggle comment visibility for a post. Pure UI state.
pub async fn toggle_comments(
    feed: web::Data<Arc<RwLock<Feed>>>,
    path: web::Path<Uuid>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    feed.write().await.toggle_comments(*path);

    Ok(redirect_to_page(&query))
}

/// Delete a post. Only reachable with `admin_mode=true`; there is no real
/// authorization behind the flag.
pub async fn delete_post(
    backend: web::Data<Arc<dyn NewsfeedBackend>>,
    feed: web::Data<Arc<RwLock<Feed>>>,
    path: web::Path<Uuid>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    if !query.is_admin() {
        return Err(AppError::NotFound("page not found".to_string()));
    }

    let deleted = feed
        .write()
        .await
        .delete(backend.get_ref().as_ref(), *path)
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("post {}", *path)));
    }

    Ok(redirect_to_page(&query))
}
