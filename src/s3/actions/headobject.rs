use crate::{
    s3::actions::{Action, key_segments, response_error},
    s3::{S3, request, tools},
};
use anyhow::{Result, anyhow};
use http::{Method, StatusCode};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct HeadObject<'a> {
    key: &'a str,
}

impl<'a> HeadObject<'a> {
    #[must_use]
    pub const fn new(key: &'a str) -> Self {
        Self { key }
    }

    /// Returns the object headers, `None` when the key does not exist
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not make the request
    pub async fn request(&self, s3: &S3) -> Result<Option<BTreeMap<String, String>>> {
        let (url, headers) = &self.sign(s3, tools::sha256_digest("").as_ref(), None, None)?;
        let response =
            request::request(s3.client(), url.clone(), self.http_method(), headers, None).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if response.status().is_success() {
            let mut h: BTreeMap<String, String> = BTreeMap::new();
            for (key, value) in response.headers() {
                if !value.is_empty() {
                    h.insert(key.as_str().to_string(), value.to_str()?.to_string());
                }
            }
            Ok(Some(h))
        } else {
            Err(anyhow!(response_error(response).await?))
        }
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_HeadObject.html>
impl Action for HeadObject<'_> {
    fn http_method(&self) -> Method {
        Method::HEAD
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Option<Vec<&str>> {
        Some(key_segments(self.key))
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }
}
