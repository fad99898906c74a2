//! Feed state and interactions.
//!
//! The feed never merges: every refresh replaces the whole list with one
//! ordered read, and the change-feed subscription triggers the same full
//! re-read on any event. Interactions are a single backend write followed
//! by an optimistic patch of just that post.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Comment, Post, SortMode};
use crate::services::backend::NewsfeedBackend;

/// How long a like stays in the animating set. Purely cosmetic.
pub const LIKE_ANIMATION: Duration = Duration::from_millis(600);

/// Mutually exclusive, render-replacing feed views.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedView {
    /// A read is in flight; nothing stale is shown.
    Loading,
    /// The collection is empty.
    Empty,
    /// The last read failed; carries the backend's message.
    Error(String),
    /// Posts are available.
    Ready,
}

/// Feed state.
pub struct Feed {
    posts: Vec<Post>,
    view: FeedView,
    sort: SortMode,
    animating_likes: HashMap<Uuid, Instant>,
    visible_comments: HashSet<Uuid>,
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            view: FeedView::Loading,
            sort: SortMode::Latest,
            animating_likes: HashMap::new(),
            visible_comments: HashSet::new(),
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn view(&self) -> &FeedView {
        &self.view
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
    }

    /// Full re-read of the collection; the result replaces the local list
    /// wholesale. Read failures surface the backend's message.
    pub async fn refresh(&mut self, backend: &dyn NewsfeedBackend) {
        self.view = FeedView::Loading;

        match backend.list_posts(self.sort).await {
            Ok(posts) => {
                self.view = if posts.is_empty() {
                    FeedView::Empty
                } else {
                    FeedView::Ready
                };
                self.posts = posts;
            }
            Err(err) => {
                error!(error = %err, "feed read failed");
                self.posts.clear();
                self.view = FeedView::Error(err.to_string());
            }
        }

        self.animating_likes
            .retain(|_, started| started.elapsed() < LIKE_ANIMATION);
    }

    /// Increment a post's like count by one.
    ///
    /// The next value is computed from the locally-held count and written
    /// back as an absolute value, so two sessions clicking concurrently race
    /// last-write-wins. Repeated clicks by the same viewer keep
    /// incrementing; there is no per-user tracking.
    pub async fn like(
        &mut self,
        backend: &dyn NewsfeedBackend,
        post_id: Uuid,
    ) -> crate::error::Result<()> {
        let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) else {
            return Err(AppError::NotFound(format!("post {post_id}")));
        };

        let next = post.likes + 1;
        backend.set_post_likes(post_id, next).await?;

        post.likes = next;
        self.animating_likes.insert(post_id, Instant::now());
        Ok(())
    }

    /// Whether the like animation is still active for this post.
    pub fn is_like_animating(&self, post_id: Uuid) -> bool {
        self.animating_likes
            .get(&post_id)
            .map(|started| started.elapsed() < LIKE_ANIMATION)
            .unwrap_or(false)
    }

    /// Append a comment and write the whole sequence back; the local copy is
    /// mirrored only after the write succeeds.
    pub async fn add_comment(
        &mut self,
        backend: &dyn NewsfeedBackend,
        post_id: Uuid,
        content: &str,
    ) -> crate::error::Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("comment is empty".to_string()));
        }

        let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) else {
            return Err(AppError::NotFound(format!("post {post_id}")));
        };

        let comment = Comment {
            // Derived from the submission time, as stored; collisions under
            // rapid double-submission are accepted.
            id: Utc::now().timestamp_millis().to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };

        let mut updated = post.comments.clone();
        updated.push(comment);

        backend.set_post_comments(post_id, &updated).await?;

        post.comments = updated;
        Ok(())
    }

    /// Toggle comment visibility for one post. Pure UI state, never
    /// persisted.
    pub fn toggle_comments(&mut self, post_id: Uuid) {
        if !self.visible_comments.remove(&post_id) {
            self.visible_comments.insert(post_id);
        }
    }

    pub fn comments_visible(&self, post_id: Uuid) -> bool {
        self.visible_comments.contains(&post_id)
    }

    /// Delete a post and drop it from the local list on success.
    pub async fn delete(
        &mut self,
        backend: &dyn NewsfeedBackend,
        post_id: Uuid,
    ) -> crate::error::Result<bool> {
        let deleted = backend.delete_post(post_id).await?;

        if deleted {
            self.posts.retain(|p| p.id != post_id);
            if self.posts.is_empty() && self.view == FeedView::Ready {
                self.view = FeedView::Empty;
            }
        }

        Ok(deleted)
    }
}

/// Format a timestamp the way the feed shows it.
pub fn format_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(ts);

    let mins = diff.num_minutes();
    if mins < 1 {
        return "just now".to_string();
    }
    if mins < 60 {
        return format!("{mins}m ago");
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{days}d ago");
    }

    ts.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::MockNewsfeedBackend;
    use chrono::TimeZone;

    fn post(content: &str, likes: i32) -> Post {
        Post {
            id: Uuid::new_v4(),
            content: content.to_string(),
            image_urls: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            likes,
            comments: Vec::new(),
        }
    }

    async fn ready_feed(posts: Vec<Post>) -> Feed {
        let mut backend = MockNewsfeedBackend::new();
        let listed = posts.clone();
        backend
            .expect_list_posts()
            .times(1)
            .returning(move |_| Ok(listed.clone()));

        let mut feed = Feed::new();
        feed.refresh(&backend).await;
        feed
    }

    #[tokio::test]
    async fn test_empty_collection_renders_empty_state_not_error() {
        let feed = ready_feed(Vec::new()).await;

        assert_eq!(*feed.view(), FeedView::Empty);
        assert!(feed.posts().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_surfaces_backend_message() {
        let mut backend = MockNewsfeedBackend::new();
        backend
            .expect_list_posts()
            .times(1)
            .returning(|_| Err(AppError::Internal("connection refused".to_string())));

        let mut feed = Feed::new();
        feed.refresh(&backend).await;

        match feed.view() {
            FeedView::Error(msg) => assert!(msg.contains("connection refused")),
            other => panic!("expected error view, got {other:?}"),
        }
        assert!(feed.posts().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_replaces_list_wholesale() {
        let first = vec![post("old", 0)];
        let second = vec![post("new a", 0), post("new b", 0)];

        let mut backend = MockNewsfeedBackend::new();
        let mut results = vec![second.clone(), first.clone()];
        backend
            .expect_list_posts()
            .times(2)
            .returning(move |_| Ok(results.pop().unwrap()));

        let mut feed = Feed::new();
        feed.refresh(&backend).await;
        assert_eq!(feed.posts().len(), 1);

        feed.refresh(&backend).await;
        assert_eq!(feed.posts().len(), 2);
        assert_eq!(*feed.view(), FeedView::Ready);
    }

    #[tokio::test]
    async fn test_like_writes_local_count_plus_one() {
        let liked = post("popular", 41);
        let liked_id = liked.id;
        let mut feed = ready_feed(vec![post("other", 7), liked]).await;

        let mut backend = MockNewsfeedBackend::new();
        backend
            .expect_set_post_likes()
            .withf(move |id, likes| *id == liked_id && *likes == 42)
            .times(1)
            .returning(|_, _| Ok(()));

        feed.like(&backend, liked_id).await.unwrap();

        let patched = feed.posts().iter().find(|p| p.id == liked_id).unwrap();
        assert_eq!(patched.likes, 42);
        assert!(feed.is_like_animating(liked_id));

        // The other post is untouched.
        assert_eq!(feed.posts()[0].likes, 7);
    }

    #[tokio::test]
    async fn test_like_unknown_post_makes_no_backend_call() {
        let mut feed = ready_feed(vec![post("a", 0)]).await;
        let backend = MockNewsfeedBackend::new();

        let result = feed.like(&backend, Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_like_failure_leaves_local_count_untouched() {
        let liked = post("p", 3);
        let liked_id = liked.id;
        let mut feed = ready_feed(vec![liked]).await;

        let mut backend = MockNewsfeedBackend::new();
        backend
            .expect_set_post_likes()
            .times(1)
            .returning(|_, _| Err(AppError::Internal("write failed".to_string())));

        assert!(feed.like(&backend, liked_id).await.is_err());
        assert_eq!(feed.posts()[0].likes, 3);
        assert!(!feed.is_like_animating(liked_id));
    }

    #[tokio::test]
    async fn test_add_comment_appends_and_mirrors_on_success() {
        let target = post("p", 0);
        let target_id = target.id;
        let mut feed = ready_feed(vec![target]).await;

        let mut backend = MockNewsfeedBackend::new();
        backend
            .expect_set_post_comments()
            .withf(move |id, comments| {
                *id == target_id && comments.len() == 1 && comments[0].content == "nice!"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        feed.add_comment(&backend, target_id, "  nice!  ").await.unwrap();

        assert_eq!(feed.posts()[0].comments.len(), 1);
        assert_eq!(feed.posts()[0].comments[0].content, "nice!");
    }

    #[tokio::test]
    async fn test_comment_failure_does_not_mirror() {
        let target = post("p", 0);
        let target_id = target.id;
        let mut feed = ready_feed(vec![target]).await;

        let mut backend = MockNewsfeedBackend::new();
        backend
            .expect_set_post_comments()
            .times(1)
            .returning(|_, _| Err(AppError::Internal("write failed".to_string())));

        assert!(feed.add_comment(&backend, target_id, "hi").await.is_err());
        assert!(feed.posts()[0].comments.is_empty());
    }

    #[tokio::test]
    async fn test_empty_comment_is_rejected_without_backend_call() {
        let target = post("p", 0);
        let target_id = target.id;
        let mut feed = ready_feed(vec![target]).await;

        let backend = MockNewsfeedBackend::new();
        let result = feed.add_comment(&backend, target_id, "   ").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_post_from_local_list() {
        let doomed = post("bye", 0);
        let doomed_id = doomed.id;
        let mut feed = ready_feed(vec![post("stays", 0), doomed]).await;

        let mut backend = MockNewsfeedBackend::new();
        backend
            .expect_delete_post()
            .withf(move |id| *id == doomed_id)
            .times(1)
            .returning(|_| Ok(true));

        assert!(feed.delete(&backend, doomed_id).await.unwrap());
        assert_eq!(feed.posts().len(), 1);
        assert_eq!(feed.posts()[0].content, "stays");
    }

    #[tokio::test]
    async fn test_deleting_last_post_shows_empty_state() {
        let only = post("alone", 0);
        let only_id = only.id;
        let mut feed = ready_feed(vec![only]).await;

        let mut backend = MockNewsfeedBackend::new();
        backend
            .expect_delete_post()
            .times(1)
            .returning(|_| Ok(true));

        feed.delete(&backend, only_id).await.unwrap();

        assert_eq!(*feed.view(), FeedView::Empty);
    }

    #[tokio::test]
    async fn test_sort_toggle_changes_ordering_never_membership() {
        let a = post("a", 1);
        let b = post("b", 5);
        let c = post("c", 3);
        let by_time = vec![a.clone(), b.clone(), c.clone()];
        let by_likes = vec![b.clone(), c.clone(), a.clone()];

        let mut backend = MockNewsfeedBackend::new();
        let time_list = by_time.clone();
        backend
            .expect_list_posts()
            .withf(|sort| *sort == SortMode::Latest)
            .returning(move |_| Ok(time_list.clone()));
        let likes_list = by_likes.clone();
        backend
            .expect_list_posts()
            .withf(|sort| *sort == SortMode::MostLiked)
            .returning(move |_| Ok(likes_list.clone()));

        let mut feed = Feed::new();
        feed.refresh(&backend).await;
        let ids_latest: HashSet<Uuid> = feed.posts().iter().map(|p| p.id).collect();

        feed.set_sort(SortMode::MostLiked);
        feed.refresh(&backend).await;
        let ids_liked: HashSet<Uuid> = feed.posts().iter().map(|p| p.id).collect();

        assert_eq!(ids_latest, ids_liked);
        assert_eq!(feed.posts()[0].content, "b");
    }

    #[tokio::test]
    async fn test_toggle_comments_is_per_post() {
        let a = post("a", 0);
        let b = post("b", 0);
        let (a_id, b_id) = (a.id, b.id);
        let mut feed = ready_feed(vec![a, b]).await;

        feed.toggle_comments(a_id);
        assert!(feed.comments_visible(a_id));
        assert!(!feed.comments_visible(b_id));

        feed.toggle_comments(a_id);
        assert!(!feed.comments_visible(a_id));
    }

    #[test]
    fn test_format_relative() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

        let cases = [
            (now - chrono::Duration::seconds(20), "just now"),
            (now - chrono::Duration::minutes(5), "5m ago"),
            (now - chrono::Duration::hours(3), "3h ago"),
            (now - chrono::Duration::days(2), "2d ago"),
            (now - chrono::Duration::days(30), "2025-05-16"),
        ];

        for (ts, expected) in cases {
            assert_eq!(format_relative(ts, now), expected);
        }
    }
}
