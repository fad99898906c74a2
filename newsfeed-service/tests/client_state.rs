//! Public-API contract for the client state types and rendering.

use newsfeed_service::models::{SortMode, MAX_POST_IMAGES};
use newsfeed_service::render::markdown::render_markdown;
use newsfeed_service::render::page::image_grid_columns;
use newsfeed_service::services::composer::{Composer, StagedImage};
use newsfeed_service::services::feed::{Feed, FeedView};

fn staged(name: &str) -> StagedImage {
    StagedImage {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xff, 0xd8],
    }
}

#[test]
fn staging_is_capped_across_any_number_of_selection_events() {
    let mut composer = Composer::new();

    for batch in 0..4 {
        composer.add_images(vec![
            staged(&format!("{batch}-a.jpg")),
            staged(&format!("{batch}-b.jpg")),
        ]);
    }

    assert_eq!(composer.images().len(), MAX_POST_IMAGES);
    assert!(!composer.can_add_images());
}

#[test]
fn removing_a_staged_image_reopens_the_add_control() {
    let mut composer = Composer::new();
    composer.add_images((0..5).map(|i| staged(&format!("{i}.jpg"))).collect());
    assert!(!composer.can_add_images());

    composer.remove_image(0);

    assert!(composer.can_add_images());
    assert_eq!(composer.images().len(), 4);
    assert_eq!(composer.previews().len(), 4);
}

#[test]
fn a_new_feed_starts_in_the_loading_view() {
    let feed = Feed::new();
    assert_eq!(*feed.view(), FeedView::Loading);
    assert_eq!(feed.sort(), SortMode::Latest);
}

#[test]
fn markdown_keeps_only_the_allow_listed_elements() {
    let html = render_markdown(
        "## Recipe\n\nSteps:\n\n1. chop\n2. fry\n\n> tasty\n\n<img src=x onerror=alert(1)>",
    );

    assert!(html.contains("<h2>Recipe</h2>"));
    assert!(html.contains("<ol><li>chop</li><li>fry</li></ol>"));
    assert!(html.contains("<blockquote>"));
    assert!(!html.contains("<img"));
    assert!(html.contains("&lt;img"));
}

#[test]
fn image_grid_bucket_is_one_two_or_three_columns() {
    let buckets: Vec<usize> = (1..=5).map(image_grid_columns).collect();
    assert_eq!(buckets, vec![1, 2, 3, 3, 3]);
}
