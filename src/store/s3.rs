//! S3 backend built on `aws-sdk-s3`
//!
//! Objects are written with a single `PutObject` per file. Credentials are
//! static (taken from the CLI or environment) and path-style addressing is
//! always used so S3-compatible endpoints work without DNS bucket names.

use super::{ObjectStore, PutAck};
use crate::error::StoreError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

/// Connection settings for the S3 backend
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
}

/// S3 object store
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a client from static credentials
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "s3-backup",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(true);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            bucket = %settings.bucket,
            region = %settings.region,
            endpoint = settings.endpoint.as_deref().unwrap_or("aws"),
            "S3 client configured"
        );

        Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        length: u64,
    ) -> Result<PutAck, StoreError> {
        let content_length = i64::try_from(length)
            .map_err(|_| StoreError::new(key, format!("object too large ({length} bytes)")))?;

        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_length(content_length)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::new(key, DisplayErrorContext(&e).to_string()))?;

        debug!(key = key, e_tag = ?output.e_tag(), "PutObject response");

        Ok(PutAck {
            e_tag: output.e_tag().map(str::to_string),
        })
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}
