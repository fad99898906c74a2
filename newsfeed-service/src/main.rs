/// Newsfeed Service - HTTP server
///
/// Wires the composer, the feed, and the backend binding to an actix-web
/// server and holds the standing change-feed subscription.
use std::path::Path;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use change_feed::{ChangePublisher, ChangeSubscriber};
use newsfeed_service::config::Config;
use newsfeed_service::handlers;
use newsfeed_service::identity;
use newsfeed_service::services::backend::{HostedBackend, NewsfeedBackend};
use newsfeed_service::services::feed::Feed;
use newsfeed_service::services::storage;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    info!(env = %config.app.env, "starting newsfeed-service");

    // Database connection pool + schema
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    // Object storage
    let s3 = storage::build_s3_client(&config.storage).await?;

    // Change feed: one publisher inside the backend binding, one standing
    // subscription that refetches the feed and pings connected browsers.
    let publisher = ChangePublisher::with_channel(
        &config.change_feed.redis_url,
        config.change_feed.channel.clone(),
    )
    .await
    .context("failed to connect change-feed publisher")?;

    let subscriber = ChangeSubscriber::with_channel(
        &config.change_feed.redis_url,
        config.change_feed.channel.clone(),
    )
    .await
    .context("failed to connect change-feed subscriber")?;

    // Local identity (display-only)
    let user = identity::load_or_create(Path::new(&config.identity.path))?;
    info!(username = %user.username, "local identity loaded");

    let backend: Arc<dyn NewsfeedBackend> = Arc::new(HostedBackend::new(
        pool,
        s3,
        config.storage.clone(),
        publisher,
    ));

    let feed = Arc::new(RwLock::new(Feed::new()));
    feed.write().await.refresh(backend.as_ref()).await;

    let (notify_tx, _) = broadcast::channel::<()>(16);

    {
        let backend = backend.clone();
        let feed = feed.clone();
        let notify_tx = notify_tx.clone();
        subscriber
            .subscribe(move |_change| {
                let backend = backend.clone();
                let feed = feed.clone();
                let notify_tx = notify_tx.clone();
                async move {
                    // Any event anywhere in the collection triggers a full
                    // re-read; the payload is never inspected.
                    feed.write().await.refresh(backend.as_ref()).await;
                    let _ = notify_tx.send(());
                }
            })
            .await
            .context("failed to subscribe to change feed")?;
    }

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    info!(%bind_address, "newsfeed-service listening");

    let user_data = web::Data::new(user);
    let backend_data = web::Data::new(backend);
    let feed_data = web::Data::new(feed);
    let notify_data = web::Data::new(notify_tx);

    HttpServer::new(move || {
        App::new()
            .app_data(user_data.clone())
            .app_data(backend_data.clone())
            .app_data(feed_data.clone())
            .app_data(notify_data.clone())
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(handlers::health))
            .route("/", web::get().to(handlers::feed_page))
            .route("/events", web::get().to(handlers::events))
            .route("/posts", web::post().to(handlers::create_post))
            .route("/posts/{id}/like", web::post().to(handlers::like_post))
            .route("/posts/{id}/comments", web::post().to(handlers::add_comment))
            .route(
                "/posts/{id}/comments/toggle",
                web::post().to(handlers::toggle_comments),
            )
            .route("/posts/{id}/delete", web::post().to(handlers::delete_post))
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {bind_address}"))?
    .run()
    .await?;

    Ok(())
}
