//! Amazon S3 multipart upload limits
//! Maximum object size 5 TB
//! Maximum number of parts per upload  10,000
//! <https://docs.aws.amazon.com/AmazonS3/latest/dev/qfacts.html>

use crate::{
    s3::actions::{Action, key_segments, response_error},
    s3::responses::CompleteMultipartUploadResult,
    s3::{S3, request, tools},
};
use anyhow::{Result, anyhow};
use bytes::Bytes;
use quick_xml::{de::from_str, se::to_string};
use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct CompleteMultipartUpload<'a> {
    key: &'a str,
    upload_id: &'a str,
    parts: BTreeMap<u16, Part>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Part {
    #[serde(rename = "ETag")]
    pub etag: String,
    #[serde(rename = "PartNumber")]
    pub number: u16,
}

#[derive(Serialize)]
#[serde(rename = "CompleteMultipartUpload")]
struct PartList<'a> {
    #[serde(rename = "Part")]
    parts: Vec<&'a Part>,
}

impl<'a> CompleteMultipartUpload<'a> {
    #[must_use]
    pub const fn new(key: &'a str, upload_id: &'a str, parts: BTreeMap<u16, Part>) -> Self {
        Self {
            key,
            upload_id,
            parts,
        }
    }

    /// Parts are sent ordered by part number
    ///
    /// # Errors
    ///
    /// Will return `Err` if the body can not be serialized or can not make the request
    pub fn body(&self) -> Result<String> {
        let list = PartList {
            parts: self.parts.values().collect(),
        };
        Ok(to_string(&list)?)
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request
    pub async fn request(&self, s3: &S3) -> Result<CompleteMultipartUploadResult> {
        let body = self.body()?;
        let digest = tools::sha256_digest(&body);
        let (url, headers) = &self.sign(s3, digest.as_ref(), None, Some(body.len()))?;

        let response = request::request(
            s3.client(),
            url.clone(),
            self.http_method(),
            headers,
            Some(Bytes::from(body)),
        )
        .await?;

        if response.status().is_success() {
            let rs: CompleteMultipartUploadResult = from_str(&response.text().await?)?;
            Ok(rs)
        } else {
            Err(anyhow!(response_error(response).await?))
        }
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CompleteMultipartUpload.html>
impl Action for CompleteMultipartUpload<'_> {
    fn http_method(&self) -> Method {
        Method::POST
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();
        map.insert("uploadId", self.upload_id);
        Some(map)
    }

    fn path(&self) -> Option<Vec<&str>> {
        Some(key_segments(self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method() {
        let action = CompleteMultipartUpload::new("key", "uid", BTreeMap::new());
        assert_eq!(Method::POST, action.http_method());
    }

    #[test]
    fn test_body_ordered() {
        let mut parts = BTreeMap::new();
        parts.insert(
            2,
            Part {
                etag: "etag2".to_string(),
                number: 2,
            },
        );
        parts.insert(
            1,
            Part {
                etag: "etag1".to_string(),
                number: 1,
            },
        );
        let action = CompleteMultipartUpload::new("key", "uid", parts);
        assert_eq!(
            action.body().unwrap(),
            "<CompleteMultipartUpload>\
             <Part><ETag>etag1</ETag><PartNumber>1</PartNumber></Part>\
             <Part><ETag>etag2</ETag><PartNumber>2</PartNumber></Part>\
             </CompleteMultipartUpload>"
        );
    }

    #[test]
    fn test_query_pairs() {
        let action = CompleteMultipartUpload::new("key", "uid", BTreeMap::new());
        let mut map = BTreeMap::new();
        map.insert("uploadId", "uid");
        assert_eq!(Some(map), action.query_pairs());
    }
}
