use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A destination that publishes named artifacts all-or-nothing.
///
/// After `put` returns `Ok`, the artifact under `name` is exactly `bytes`.
/// If it fails, readers see either the previous artifact or none.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Where `name` is (or would be) published, for logging and summaries.
    fn location(&self, name: &str) -> String;

    /// Publishes `bytes` under `name`, replacing any previous artifact.
    async fn put(&self, name: &str, bytes: Bytes) -> Result<String>;
}
