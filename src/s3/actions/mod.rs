//! Actions
//! <https://docs.aws.amazon.com/AmazonS3/latest/API/API_Operations.html>

use crate::s3::S3;
use crate::s3::responses::ErrorResponse;
use crate::s3::signature::Signature;
use anyhow::{Result, anyhow};
use http::{HeaderMap, Method, StatusCode};
use quick_xml::de::from_str;
use reqwest::Response;
use std::collections::BTreeMap;
use url::Url;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CreateBucket.html>
mod createbucket;
pub use self::createbucket::CreateBucket;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_HeadObject.html>
mod headobject;
pub use self::headobject::HeadObject;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_PutObject.html>
mod putobject;
pub use self::putobject::PutObject;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CreateMultipartUpload.html>
mod createmultipartupload;
pub use self::createmultipartupload::CreateMultipartUpload;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_UploadPart.html>
mod uploadpart;
pub use self::uploadpart::UploadPart;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CompleteMultipartUpload.html>
mod completemultipartupload;
pub use self::completemultipartupload::{CompleteMultipartUpload, Part};

pub trait Action {
    // headers to send in the request
    fn headers(&self) -> Option<BTreeMap<&str, &str>>;

    // method to use GET/PUT...
    fn http_method(&self) -> Method;

    // URL query pairs
    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>>;

    // URL path
    fn path(&self) -> Option<Vec<&str>>;

    /// # Errors
    ///
    /// Will return `Err` if the endpoint can not be built
    fn sign(
        &self,
        s3: &S3,
        hash_payload: &[u8],
        md5: Option<&str>,
        content_length: Option<usize>,
    ) -> Result<(Url, BTreeMap<String, String>)> {
        let mut url = s3.endpoint()?;

        // object key segments
        if let Some(path) = self.path() {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| anyhow!("endpoint can not be a base URL"))?;
            segments.pop_if_empty();
            for p in path {
                segments.push(p);
            }
        }

        if let Some(pairs) = &self.query_pairs() {
            for (k, v) in pairs {
                url.query_pairs_mut().append_pair(k, v);
            }
        }

        let mut signature = Signature::new(s3, "s3", self.http_method());
        let headers = signature.sign(&url, hash_payload, md5, content_length, self.headers());
        Ok((url, headers))
    }
}

/// Split an object key into URL path segments, dropping the empty ones so
/// `/2024/01/02/key` and `2024/01/02/key` address the same object.
#[must_use]
pub fn key_segments(key: &str) -> Vec<&str> {
    key.split('/').filter(|p| !p.is_empty()).collect()
}

/// # Errors
///
/// Will return `Err` if the body can not be read
pub async fn response_error(response: Response) -> Result<String> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await?;
    Ok(error_message(status, &headers, &body))
}

/// Human readable summary of a failed S3 response
#[must_use]
pub fn error_message(status: StatusCode, headers: &HeaderMap, body: &str) -> String {
    let mut error: BTreeMap<&str, String> = BTreeMap::new();
    error.insert("HTTP Status Code", status.to_string());

    if let Some(x_amz_id_2) = headers.get("x-amz-id-2").and_then(|v| v.to_str().ok()) {
        error.insert("x-amz-id-2", x_amz_id_2.to_string());
    }

    if let Some(rid) = headers
        .get("x-amz-request-id")
        .and_then(|v| v.to_str().ok())
    {
        error.insert("Request ID", rid.to_string());
    }

    if let Ok(e) = from_str::<ErrorResponse>(body) {
        error.insert("Code", e.code);
        error.insert("Message", e.message);
    } else if !body.is_empty() {
        error.insert("Response", body.to_string());
    }

    error
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<String>>()
        .join(", ")
}
