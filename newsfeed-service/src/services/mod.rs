/// Service layer
///
/// This module provides:
/// - Backend binding: the one configured handle to the hosted services
/// - Composer: staged input and the submit flow
/// - Feed: the post list and its per-post interactions
/// - Storage: S3 client construction and image upload
pub mod backend;
pub mod composer;
pub mod feed;
pub mod storage;

pub use backend::{HostedBackend, NewsfeedBackend};
pub use composer::{Composer, StagedImage};
pub use feed::{Feed, FeedView};
