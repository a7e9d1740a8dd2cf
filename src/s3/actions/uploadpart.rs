use crate::{
    s3::actions::{Action, key_segments, response_error},
    s3::{S3, request, tools},
};
use anyhow::{Result, anyhow};
use bytes::Bytes;
use reqwest::Method;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct UploadPart<'a> {
    key: &'a str,
    part_number: String,
    upload_id: &'a str,
    body: Bytes,
}

impl<'a> UploadPart<'a> {
    #[must_use]
    pub fn new(key: &'a str, part_number: u16, upload_id: &'a str, body: Bytes) -> Self {
        Self {
            key,
            part_number: part_number.to_string(),
            upload_id,
            body,
        }
    }

    /// Returns the `ETag` of the part
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
            match response.headers().get("ETag") {
                Some(etag) => Ok(etag.to_str()?.to_string()),
                None => Err(anyhow!("missing ETag")),
            }
        } else {
            Err(anyhow!(response_error(response).await?))
        }
    }
}

// https://docs.aws.amazon.com/AmazonS3/latest/API/API_UploadPart.html
impl Action for UploadPart<'_> {
    fn http_method(&self) -> Method {
        Method::PUT
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();
        map.insert("partNumber", &self.part_number);
        map.insert("uploadId", self.upload_id);
        Some(map)
    }

    fn path(&self) -> Option<Vec<&str>> {
        Some(key_segments(self.key))
    }
}
