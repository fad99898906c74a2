/// Rendering layer
///
/// - `markdown`: restricted markdown-to-HTML for post content
/// - `page`: server-side HTML for the feed page
pub mod markdown;
pub mod page;
