pub mod actions;
pub mod credentials;
pub mod limits;
pub mod region;
pub mod request;
pub mod responses;
pub mod signature;
pub mod tools;

pub use self::{credentials::Credentials, region::Region, signature::Signature};

use anyhow::{Result, anyhow};
use reqwest::Client;
use std::fmt;
use url::Url;

#[derive(Debug, Clone)]
pub struct S3 {
    // AWS Credentials
    credentials: Credentials,
    // AWS Region
    region: Region,
    // bucket name
    bucket: Option<String>,
    // skip SigV4, for public buckets
    no_sign_request: bool,
    // shared connection pool
    client: Client,
}

// Amazon S3 API Reference
// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_Operations.html>
impl S3 {
    #[must_use]
    pub fn new(
        credentials: &Credentials,
        region: &Region,
        bucket: Option<String>,
        no_sign_request: bool,
    ) -> Self {
        Self {
            credentials: credentials.clone(),
            region: region.clone(),
            bucket,
            no_sign_request,
            client: Client::new(),
        }
    }

    /// Path-style endpoint, `https://<endpoint>/<bucket>`
    ///
    /// # Errors
    ///
    /// Will return `Err` if the region endpoint is not a valid URL
    pub fn endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&self.region.endpoint_url())?;

        if let Some(bucket) = &self.bucket {
            url.path_segments_mut()
                .map_err(|()| anyhow!("endpoint can not be a base URL"))?
                .pop_if_empty()
                .push(bucket);
        }

        Ok(url)
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    #[must_use]
    pub const fn no_sign_request(&self) -> bool {
        self.no_sign_request
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

impl fmt::Display for S3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "region: {}", self.region.name())?;
        writeln!(f, "endpoint: {}", self.region.endpoint_url())?;
        writeln!(f, "bucket: {}", self.bucket.as_deref().unwrap_or_default())?;
        writeln!(f, "access key: {}", self.credentials.aws_access_key_id())?;
        write!(f, "no sign request: {}", self.no_sign_request)
    }
}
