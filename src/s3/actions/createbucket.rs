use crate::{
    s3::actions::{Action, error_message},
    s3::responses::ErrorResponse,
    s3::{Region, S3, request, tools},
    store::BucketStatus,
};
use anyhow::{Result, anyhow};
use bytes::Bytes;
use http::method::Method;
use quick_xml::de::from_str;
use std::collections::BTreeMap;

const BUCKET_ALREADY_OWNED: &str = "BucketAlreadyOwnedByYou";

#[derive(Debug)]
pub struct CreateBucket<'a> {
    acl: &'a str,
}

impl<'a> CreateBucket<'a> {
    #[must_use]
    pub const fn new(acl: &'a str) -> Self {
        Self { acl }
    }

    /// `BucketAlreadyOwnedByYou` is reported as [`BucketStatus::AlreadyOwned`]
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not make the request or S3 rejects it
    pub async fn request(self, s3: &S3) -> Result<BucketStatus> {
        let body = location_constraint(s3.region());

        let (url, headers) = &self.sign(
            s3,
            tools::sha256_digest(&body).as_ref(),
            None,
            Some(body.len()),
        )?;

        let response = request::request(
            s3.client(),
            url.clone(),
            self.http_method(),
            headers,
            Some(Bytes::from(body)),
        )
        .await?;

        if response.status().is_success() {
            return Ok(BucketStatus::Created);
        }

        let status = response.status();
        let response_headers = response.headers().clone();
        let text = response.text().await?;

        if from_str::<ErrorResponse>(&text).is_ok_and(|e| e.code == BUCKET_ALREADY_OWNED) {
            return Ok(BucketStatus::AlreadyOwned);
        }

        Err(anyhow!(error_message(status, &response_headers, &text)))
    }
}

// us-east-1 and custom endpoints take no LocationConstraint
fn location_constraint(region: &Region) -> String {
    match region {
        Region::Aws { name } if name != "us-east-1" => format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<CreateBucketConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
    <LocationConstraint>{name}</LocationConstraint>
</CreateBucketConfiguration>"#
        ),
        _ => String::new(),
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CreateBucket.html>
impl Action for CreateBucket<'_> {
    fn http_method(&self) -> Method {
        Method::PUT
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();

        map.insert("x-amz-acl", self.acl);

        Some(map)
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Option<Vec<&str>> {
        None
    }
}
