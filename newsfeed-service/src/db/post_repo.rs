use crate::models::{Comment, Post, SortMode};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn row_to_post(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        content: row.get("content"),
        image_urls: row.get::<Json<Vec<String>>, _>("image_urls").0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        likes: row.get("likes"),
        comments: row.get::<Json<Vec<Comment>>, _>("comments").0,
    }
}

/// Insert a new post with no images, no likes, and no comments.
/// Returns the created post.
pub async fn insert_post(pool: &PgPool, content: &str) -> Result<Post, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO posts (content, image_urls, likes, comments)
        VALUES ($1, '[]'::jsonb, 0, '[]'::jsonb)
        RETURNING id, content, image_urls, created_at, updated_at, likes, comments
        "#,
    )
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(row_to_post(&row))
}

/// Read the whole post collection with the requested ordering.
pub async fn list_posts(pool: &PgPool, sort: SortMode) -> Result<Vec<Post>, sqlx::Error> {
    let query = match sort {
        SortMode::Latest => {
            r#"
            SELECT id, content, image_urls, created_at, updated_at, likes, comments
            FROM posts
            ORDER BY created_at DESC
            "#
        }
        SortMode::MostLiked => {
            r#"
            SELECT id, content, image_urls, created_at, updated_at, likes, comments
            FROM posts
            ORDER BY likes DESC, created_at DESC
            "#
        }
    };

    let rows = sqlx::query(query).fetch_all(pool).await?;

    Ok(rows.iter().map(row_to_post).collect())
}

/// Replace a post's image URL sequence in one write.
pub async fn update_image_urls(
    pool: &PgPool,
    post_id: Uuid,
    urls: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE posts
        SET image_urls = $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(Json(urls))
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite the stored like count with a client-computed value.
///
/// Deliberately not `likes = likes + 1`: the caller computes the next value
/// from its local read, so concurrent sessions race last-write-wins.
pub async fn update_likes(pool: &PgPool, post_id: Uuid, likes: i32) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE posts
        SET likes = $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(likes)
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite the whole comment sequence.
pub async fn update_comments(
    pool: &PgPool,
    post_id: Uuid,
    comments: &[Comment],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE posts
        SET comments = $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(Json(comments))
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a post row outright. Returns whether a row was deleted.
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
