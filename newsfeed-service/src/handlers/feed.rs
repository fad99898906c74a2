//! Feed page, change-event stream, and health.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tokio::sync::{broadcast, RwLock};

use crate::handlers::FeedQuery;
use crate::models::LocalUser;
use crate::render::page::render_page;
use crate::services::backend::NewsfeedBackend;
use crate::services::composer::Composer;
use crate::services::feed::Feed;

/// Render the feed page.
///
/// Every page load is a mount: the sort mode is taken from the query and a
/// full read replaces the feed before rendering.
pub async fn feed_page(
    backend: web::Data<Arc<dyn NewsfeedBackend>>,
    feed: web::Data<Arc<RwLock<Feed>>>,
    user: web::Data<LocalUser>,
    query: web::Query<FeedQuery>,
) -> HttpResponse {
    let mut guard = feed.write().await;
    guard.set_sort(query.sort_mode());
    guard.refresh(backend.get_ref().as_ref()).await;

    let html = render_page(&guard, &user, &Composer::new(), query.is_admin());

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

/// Server-sent-events bridge for the change feed.
///
/// Browsers reload on any event; the payload is a constant because the
/// change feed is an invalidation signal, nothing more.
pub async fn events(notify: web::Data<broadcast::Sender<()>>) -> HttpResponse {
    let rx = notify.subscribe();

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(()) => {
                    let chunk = web::Bytes::from_static(b"data: changed\n\n");
                    return Some((Ok::<web::Bytes, actix_web::Error>(chunk), rx));
                }
                // A lagged receiver only means events were coalesced; the
                // next send still triggers a reload.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}
