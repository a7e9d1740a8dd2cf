use crate::{
    s3::actions::{Action, key_segments, response_error},
    s3::responses::InitiateMultipartUploadResult,
    s3::{S3, request, tools},
};
use anyhow::{Result, anyhow};
use quick_xml::de::from_str;
use reqwest::Method;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct CreateMultipartUpload<'a> {
    key: &'a str,
    acl: Option<&'a str>,
}

impl<'a> CreateMultipartUpload<'a> {
    #[must_use]
    pub const fn new(key: &'a str, acl: Option<&'a str>) -> Self {
        Self { key, acl }
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request
    pub async fn request(&self, s3: &S3) -> Result<InitiateMultipartUploadResult> {
        let (url, headers) = &self.sign(s3, tools::sha256_digest("").as_ref(), None, None)?;

        let response =
            request::request(s3.client(), url.clone(), self.http_method(), headers, None).await?;

        if response.status().is_success() {
            let upload_req: InitiateMultipartUploadResult = from_str(&response.text().await?)?;
            Ok(upload_req)
        } else {
            Err(anyhow!(response_error(response).await?))
        }
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CreateMultipartUpload.html>
impl Action for CreateMultipartUpload<'_> {
    fn http_method(&self) -> Method {
        Method::POST
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();

        if let Some(acl) = self.acl {
            map.insert("x-amz-acl", acl);
        }

        Some(map)
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();
        map.insert("uploads", "");
        Some(map)
    }

    fn path(&self) -> Option<Vec<&str>> {
        Some(key_segments(self.key))
    }
}
