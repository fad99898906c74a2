/// HTTP delivery layer.
///
/// The feed page is rendered server-side; the composer and every per-post
/// interaction are plain form posts that redirect back to the page; the
/// change feed reaches browsers as a server-sent-events stream.
pub mod feed;
pub mod posts;

use actix_web::http::header;
use actix_web::HttpResponse;
use serde::Deserialize;

use crate::models::SortMode;

pub use feed::{events, feed_page, health};
pub use posts::{add_comment, create_post, delete_post, like_post, toggle_comments};

/// The recognized query-parameter surface: a sort selector and the
/// admin-mode flag. Nothing else is read from the URL.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub sort: Option<String>,
    pub admin_mode: Option<String>,
}

impl FeedQuery {
    pub fn sort_mode(&self) -> SortMode {
        SortMode::parse(self.sort.as_deref().unwrap_or(""))
    }

    pub fn is_admin(&self) -> bool {
        self.admin_mode.as_deref() == Some("true")
    }

    /// URL of the feed page carrying the current query state.
    pub fn page_url(&self) -> String {
        let mut url = format!("/?sort={}", self.sort_mode().as_query_value());
        if self.is_admin() {
            url.push_str("&admin_mode=true");
        }
        url
    }
}

/// 303 back to the feed page after a form post.
pub fn redirect_to_page(query: &FeedQuery) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, query.page_url()))
        .finish()
}
