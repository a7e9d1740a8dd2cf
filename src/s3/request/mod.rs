use anyhow::Result;
use bytes::Bytes;
use reqwest::{
    Client, Method, Response,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::collections::BTreeMap;
use url::Url;

/// Send a signed request, the `headers` are the ones returned by
/// [`crate::s3::Signature::sign`].
///
/// # Errors
///
/// Will return `Err` if the headers are invalid or can not make the request
pub async fn request(
    client: &Client,
    url: Url,
    method: Method,
    headers: &BTreeMap<String, String>,
    body: Option<Bytes>,
) -> Result<Response> {
    let headers = headers
        .iter()
        .map(|(k, v)| Ok((k.parse::<HeaderName>()?, v.parse::<HeaderValue>()?)))
        .collect::<Result<HeaderMap>>()?;

    let request = client.request(method, url).headers(headers);

    let request = match body {
        Some(body) => request.body(body),
        None => request,
    };

    Ok(request.send().await?)
}
