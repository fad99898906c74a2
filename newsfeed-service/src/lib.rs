//! Newsfeed service
//!
//! A minimal social newsfeed: compose a markdown post with up to five
//! images, list posts by recency or like count, like/comment/delete, live
//! refresh when any post changes.
//!
//! The three pieces of the system are explicit types: the [`Composer`]
//! (staged input and the submit flow), the [`Feed`] (post list, view phase,
//! and per-post interactions), and the backend binding (one configured
//! handle to the Postgres row store, the S3 object store, and the Redis
//! change feed). An actix-web layer drives them.
//!
//! [`Composer`]: services::composer::Composer
//! [`Feed`]: services::feed::Feed

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod render;
pub mod services;
