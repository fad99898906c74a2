//! Server-side HTML for the feed page.
//!
//! One document: the composer form on top, the feed below, an overlay
//! viewer for images, and a small script that reloads the page whenever the
//! change feed signals and confirms deletes.

use chrono::Utc;

use crate::models::{LocalUser, Post, SortMode};
use crate::render::markdown::{escape_html, render_markdown};
use crate::services::composer::Composer;
use crate::services::feed::{format_relative, Feed, FeedView};

/// Grid column count for an image set: 1 and 2 images get their own bucket,
/// everything above shares the 3-column grid.
pub fn image_grid_columns(count: usize) -> usize {
    match count {
        0 | 1 => 1,
        2 => 2,
        _ => 3,
    }
}

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; background: #f3f4f6; color: #111827; }
header.site { position: sticky; top: 0; background: #fff; border-bottom: 1px solid #e5e7eb; padding: 16px; }
header.site h1 { margin: 0; font-size: 24px; }
header.site .who { color: #6b7280; font-size: 13px; }
main { max-width: 720px; margin: 0 auto; padding: 24px 16px; }
.card { background: #fff; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,.1); padding: 16px; margin-bottom: 16px; }
.composer textarea { width: 100%; box-sizing: border-box; padding: 12px; border: 1px solid #d1d5db; border-radius: 8px; resize: none; font: inherit; }
.composer .actions { display: flex; gap: 8px; margin-top: 12px; }
.composer button, .composer input[type=file] { font: inherit; }
.composer button[type=submit] { background: #3b82f6; color: #fff; border: 0; border-radius: 8px; padding: 8px 16px; cursor: pointer; }
.composer button[disabled] { opacity: .5; cursor: not-allowed; }
.banner { background: #fee2e2; color: #b91c1c; padding: 12px; border-radius: 8px; margin-top: 12px; }
.previews { margin: 8px 0 0; padding-left: 20px; color: #6b7280; font-size: 13px; }
.empty { text-align: center; color: #6b7280; padding: 32px; }
.spinner { margin: 32px auto; width: 32px; height: 32px; border: 3px solid #e5e7eb; border-bottom-color: #3b82f6; border-radius: 50%; animation: spin 1s linear infinite; }
@keyframes spin { to { transform: rotate(360deg); } }
article.post .timestamp { color: #6b7280; font-size: 13px; }
article.post .content { margin-top: 8px; overflow-wrap: break-word; }
article.post .content blockquote { border-left: 3px solid #d1d5db; margin: 8px 0; padding-left: 12px; color: #4b5563; }
.grid { display: grid; gap: 8px; margin-top: 12px; }
.grid.cols-1 { grid-template-columns: 1fr; }
.grid.cols-2 { grid-template-columns: repeat(2, 1fr); }
.grid.cols-3 { grid-template-columns: repeat(3, 1fr); }
.grid img { width: 100%; aspect-ratio: 1; object-fit: cover; border-radius: 8px; cursor: pointer; }
footer.post-actions { display: flex; gap: 8px; margin-top: 12px; }
footer.post-actions button { background: none; border: 0; color: #6b7280; cursor: pointer; font: inherit; }
footer.post-actions button:hover { color: #3b82f6; }
footer.post-actions button.animating { color: #ef4444; transform: scale(1.15); }
.sort-toggle { margin-bottom: 16px; font-size: 14px; }
.sort-toggle a { color: #6b7280; text-decoration: none; margin-right: 12px; }
.sort-toggle a.active { color: #3b82f6; font-weight: 600; }
.comments ul { list-style: none; padding: 0; margin: 8px 0; }
.comments li { border-top: 1px solid #f3f4f6; padding: 8px 0; font-size: 14px; }
.comments .when { color: #9ca3af; font-size: 12px; margin-left: 8px; }
.comments input { flex: 1; padding: 8px; border: 1px solid #d1d5db; border-radius: 8px; font: inherit; }
.comments form { display: flex; gap: 8px; }
#overlay { display: none; position: fixed; inset: 0; background: rgba(0,0,0,.85); z-index: 100; align-items: center; justify-content: center; }
#overlay.open { display: flex; }
#overlay img { max-width: 90vw; max-height: 90vh; }
#overlay .close { position: absolute; top: 16px; right: 24px; color: #fff; font-size: 32px; cursor: pointer; }
"#;

const SCRIPT: &str = r#"
const events = new EventSource('/events');
events.onmessage = () => window.location.reload();

document.querySelectorAll('.delete-form').forEach((form) => {
  form.addEventListener('submit', (e) => {
    if (!window.confirm('Delete this post?')) {
      e.preventDefault();
    }
  });
});

const overlay = document.getElementById('overlay');
const overlayImage = document.getElementById('overlay-image');
document.querySelectorAll('.grid img').forEach((img) => {
  img.addEventListener('click', () => {
    overlayImage.src = img.src;
    overlay.classList.add('open');
  });
});
overlay.addEventListener('click', (e) => {
  if (e.target !== overlayImage) {
    overlay.classList.remove('open');
  }
});
"#;

/// Render the whole feed page.
pub fn render_page(
    feed: &Feed,
    user: &LocalUser,
    composer: &Composer,
    admin_mode: bool,
) -> String {
    let qs = query_string(feed.sort(), admin_mode);

    let mut html = String::from("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    html.push_str("<title>Newsfeed</title>");
    html.push_str(&format!("<style>{STYLE}</style></head><body>"));

    html.push_str(&format!(
        "<header class=\"site\"><h1>\u{1f4f0} Newsfeed</h1><span class=\"who\">Posting as {}</span></header>",
        escape_html(&user.username)
    ));

    html.push_str("<main>");
    html.push_str(&render_composer(composer, &qs));
    html.push_str(&render_sort_toggle(feed.sort(), admin_mode));
    html.push_str(&render_feed(feed, admin_mode, &qs));
    html.push_str("</main>");

    html.push_str(
        "<div id=\"overlay\"><span class=\"close\">\u{2715}</span><img id=\"overlay-image\" alt=\"\"></div>",
    );
    html.push_str(&format!("<script>{SCRIPT}</script></body></html>"));

    html
}

fn query_string(sort: SortMode, admin_mode: bool) -> String {
    let mut qs = format!("sort={}", sort.as_query_value());
    if admin_mode {
        qs.push_str("&admin_mode=true");
    }
    qs
}

fn render_composer(composer: &Composer, qs: &str) -> String {
    let mut html = format!(
        "<div class=\"card composer\"><form method=\"post\" action=\"/posts?{qs}\" enctype=\"multipart/form-data\">"
    );

    html.push_str(&format!(
        "<textarea name=\"content\" rows=\"3\" placeholder=\"What&#39;s on your mind?\">{}</textarea>",
        escape_html(composer.content())
    ));

    if !composer.previews().is_empty() {
        html.push_str("<ul class=\"previews\">");
        for name in composer.previews() {
            html.push_str(&format!("<li>{}</li>", escape_html(name)));
        }
        html.push_str("</ul>");
    }

    if let Some(error) = composer.error() {
        html.push_str(&format!("<div class=\"banner\">{}</div>", escape_html(error)));
    }

    let file_disabled = if composer.can_add_images() { "" } else { " disabled" };
    let submit_disabled = if composer.is_submitting() { " disabled" } else { "" };
    html.push_str(&format!(
        "<div class=\"actions\"><input type=\"file\" name=\"images\" accept=\"image/*\" multiple{file_disabled}>\
         <button type=\"submit\"{submit_disabled}>Post</button></div>"
    ));

    html.push_str("</form></div>");
    html
}

fn render_sort_toggle(sort: SortMode, admin_mode: bool) -> String {
    let admin = if admin_mode { "&admin_mode=true" } else { "" };
    let (latest_class, likes_class) = match sort {
        SortMode::Latest => (" class=\"active\"", ""),
        SortMode::MostLiked => ("", " class=\"active\""),
    };

    format!(
        "<nav class=\"sort-toggle\">\
         <a href=\"/?sort=latest{admin}\"{latest_class}>Latest</a>\
         <a href=\"/?sort=likes{admin}\"{likes_class}>Most liked</a>\
         </nav>"
    )
}

fn render_feed(feed: &Feed, admin_mode: bool, qs: &str) -> String {
    match feed.view() {
        FeedView::Loading => "<div class=\"spinner\"></div>".to_string(),
        FeedView::Error(message) => {
            format!("<div class=\"banner\">Error: {}</div>", escape_html(message))
        }
        FeedView::Empty => {
            "<div class=\"card empty\">No posts yet. Be the first to share something!</div>"
                .to_string()
        }
        FeedView::Ready => {
            let mut html = String::new();
            for post in feed.posts() {
                html.push_str(&render_post(post, feed, admin_mode, qs));
            }
            html
        }
    }
}

fn render_post(post: &Post, feed: &Feed, admin_mode: bool, qs: &str) -> String {
    let id = post.id;
    let mut html = String::from("<article class=\"card post\">");

    html.push_str(&format!(
        "<span class=\"timestamp\">{}</span>",
        escape_html(&format_relative(post.created_at, Utc::now()))
    ));

    html.push_str(&format!(
        "<div class=\"content\">{}</div>",
        render_markdown(&post.content)
    ));

    if !post.image_urls.is_empty() {
        let cols = image_grid_columns(post.image_urls.len());
        html.push_str(&format!("<div class=\"grid cols-{cols}\">"));
        for url in &post.image_urls {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"Post image\">",
                escape_html(url)
            ));
        }
        html.push_str("</div>");
    }

    let like_class = if feed.is_like_animating(id) {
        " class=\"animating\""
    } else {
        ""
    };
    html.push_str("<footer class=\"post-actions\">");
    html.push_str(&format!(
        "<form method=\"post\" action=\"/posts/{id}/like?{qs}\">\
         <button type=\"submit\"{like_class}>\u{2764}\u{fe0f} Like ({})</button></form>",
        post.likes
    ));
    html.push_str(&format!(
        "<form method=\"post\" action=\"/posts/{id}/comments/toggle?{qs}\">\
         <button type=\"submit\">\u{1f4ac} Comments ({})</button></form>",
        post.comments.len()
    ));
    if admin_mode {
        html.push_str(&format!(
            "<form class=\"delete-form\" method=\"post\" action=\"/posts/{id}/delete?{qs}\">\
             <button type=\"submit\">\u{1f5d1} Delete</button></form>"
        ));
    }
    html.push_str("</footer>");

    if feed.comments_visible(id) {
        html.push_str("<section class=\"comments\">");
        if !post.comments.is_empty() {
            html.push_str("<ul>");
            for comment in &post.comments {
                html.push_str(&format!(
                    "<li>{}<span class=\"when\">{}</span></li>",
                    escape_html(&comment.content),
                    escape_html(&format_relative(comment.created_at, Utc::now()))
                ));
            }
            html.push_str("</ul>");
        }
        html.push_str(&format!(
            "<form method=\"post\" action=\"/posts/{id}/comments?{qs}\">\
             <input name=\"content\" placeholder=\"Write a comment...\" autocomplete=\"off\">\
             <button type=\"submit\">Reply</button></form>"
        ));
        html.push_str("</section>");
    }

    html.push_str("</article>");
    html
}
