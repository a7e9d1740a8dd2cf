use crate::{
    s3::actions::{Action, key_segments, response_error},
    s3::{S3, request, tools},
};
use anyhow::{Result, anyhow};
use bytes::Bytes;
use reqwest::Method;
use std::collections::BTreeMap;

/// Single request upload, used when the whole object fits in one part
#[derive(Debug)]
pub struct PutObject<'a> {
    key: &'a str,
    body: Bytes,
    acl: Option<&'a str>,
}

impl<'a> PutObject<'a> {
    #[must_use]
    pub const fn new(key: &'a str, body: Bytes, acl: Option<&'a str>) -> Self {
        Self { key, body, acl }
    }

    /// Returns the `ETag` of the stored object
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not make the request
    pub async fn request(self, s3: &S3) -> Result<String> {
        let sha = tools::sha256_digest(&self.body);
        let md5 = tools::base64_md5(&self.body);

        let (url, headers) = &self.sign(s3, sha.as_ref(), Some(&md5), Some(self.body.len()))?;

        let response = request::request(
            s3.client(),
            url.clone(),
            self.http_method(),
            headers,
            Some(self.body),
        )
        .await?;

        if response.status().is_success() {
            Ok(response
                .headers()
                .get("ETag")
                .map(|etag| etag.to_str().map(ToString::to_string))
                .transpose()?
                .unwrap_or_default())
        } else {
            Err(anyhow!(response_error(response).await?))
        }
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_PutObject.html>
impl Action for PutObject<'_> {
    fn http_method(&self) -> Method {
        Method::PUT
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();

        // https://docs.aws.amazon.com/AmazonS3/latest/API/API_PutObjectAcl.html
        if let Some(acl) = self.acl {
            map.insert("x-amz-acl", acl);
        }

        Some(map)
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Option<Vec<&str>> {
        Some(key_segments(self.key))
    }
}
