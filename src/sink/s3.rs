use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::debug;

use super::store::ArtifactStore;
use crate::error::{EtlError, Result};

/// Writes artifacts as `s3://<bucket>/<prefix>/<name>.parquet`.
///
/// A single `PutObject` either fully replaces the object or leaves it untouched.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// Creates a store using the ambient AWS configuration.
    pub async fn from_env(bucket: String, prefix: String) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket, prefix)
    }

    pub fn key(&self, name: &str) -> String {
        object_key(&self.prefix, name)
    }
}

fn object_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        format!("{name}.parquet")
    } else {
        format!("{prefix}/{name}.parquet")
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    fn location(&self, name: &str) -> String {
        format!("s3://{}/{}", self.bucket, self.key(name))
    }

    async fn put(&self, name: &str, bytes: Bytes) -> Result<String> {
        let key = self.key(name);
        debug!(bucket = %self.bucket, key = %key, bytes = bytes.len(), "Uploading artifact");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type("application/vnd.apache.parquet")
            .send()
            .await
            .map_err(|e| EtlError::WriteFailure {
                view: name.to_string(),
                reason: format!("S3 PutObject failed for '{key}': {}", DisplayErrorContext(e)),
            })?;

        Ok(self.location(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_with_and_without_prefix() {
        assert_eq!(object_key("", "monthly_revenue"), "monthly_revenue.parquet");
        assert_eq!(
            object_key("trips/2024", "high_value_trips"),
            "trips/2024/high_value_trips.parquet"
        );
    }
}
