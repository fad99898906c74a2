//! Object storage: S3 client construction and image upload.

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

/// Build an AWS S3 client from the provided configuration.
pub async fn build_s3_client(config: &StorageConfig) -> Result<Client> {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "newsfeed-service",
    );

    let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .credentials_provider(credentials)
        .load()
        .await;

    let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
    if let Some(endpoint) = &config.endpoint {
        if !endpoint.trim().is_empty() {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
    }

    Ok(Client::from_conf(builder.build()))
}

/// Upload one image under the given key and return its public URL.
pub async fn upload_image(
    client: &Client,
    config: &StorageConfig,
    key: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String> {
    client
        .put_object()
        .bucket(&config.bucket)
        .key(key)
        .content_type(content_type)
        .body(ByteStream::from(bytes))
        .send()
        .await
        .map_err(|e| AppError::Upload(format!("failed to upload {key}: {e}")))?;

    Ok(config.public_url(key))
}
