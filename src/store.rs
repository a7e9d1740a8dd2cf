//! Object store boundary used by the middleware
//!
//! The middleware only needs three calls: provision the bucket, upload a
//! stream under a key and check that a key exists. [`S3`] implements them over
//! the signed REST actions in [`crate::s3::actions`].

use crate::{
    s3::{S3, actions, limits::MIN_PART_SIZE_BYTES},
    stream,
};
use anyhow::Result;
use std::{collections::BTreeMap, future::Future};
use tokio::io::AsyncRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Created,
    // BucketAlreadyOwnedByYou
    AlreadyOwned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    pub acl: String,
    pub part_size: usize,
    pub max_requests: usize,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            acl: "private".to_string(),
            part_size: MIN_PART_SIZE_BYTES,
            max_requests: 1,
        }
    }
}

pub trait ObjectStore: Send + Sync + 'static {
    /// Bucket every call operates on
    fn bucket(&self) -> &str;

    /// Create the bucket, owning it already is not an error
    fn create_bucket(&self, acl: &str) -> impl Future<Output = Result<BucketStatus>> + Send;

    /// Object headers, `None` if the key does not exist
    fn head_object(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<BTreeMap<String, String>>>> + Send;

    /// Upload everything `reader` yields under `key` and return the `ETag`
    fn put_stream<R>(
        &self,
        key: &str,
        reader: &mut R,
        options: &PutOptions,
    ) -> impl Future<Output = Result<String>> + Send
    where
        R: AsyncRead + Unpin + Send;
}

impl ObjectStore for S3 {
    fn bucket(&self) -> &str {
        Self::bucket(self).unwrap_or_default()
    }

    async fn create_bucket(&self, acl: &str) -> Result<BucketStatus> {
        actions::CreateBucket::new(acl).request(self).await
    }

    async fn head_object(&self, key: &str) -> Result<Option<BTreeMap<String, String>>> {
        actions::HeadObject::new(key).request(self).await
    }

    async fn put_stream<R>(&self, key: &str, reader: &mut R, options: &PutOptions) -> Result<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        stream::upload(self, key, reader, options).await
    }
}
