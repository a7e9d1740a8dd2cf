//!  S3 signature v4
//! <https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html>

use crate::s3::S3;
use crate::s3::tools::{sha256_digest, sha256_hmac, write_hex_bytes};
use chrono::prelude::{DateTime, Utc};
use http::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use ring::hmac;
use std::collections::BTreeMap;
use url::Url;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// URI encode every byte except the unreserved characters:
// 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug)]
pub struct Signature<'a> {
    s3: &'a S3,
    // "s3"
    service: &'static str,
    // The HTTPRequestMethod
    method: Method,
    // The HTTP request headers, lowercase keys
    headers: BTreeMap<String, String>,
    // current date & time
    datetime: DateTime<Utc>,
}

impl<'a> Signature<'a> {
    #[must_use]
    pub fn new(s3: &'a S3, service: &'static str, method: Method) -> Self {
        Self {
            s3,
            service,
            method,
            headers: BTreeMap::new(),
            datetime: Utc::now(),
        }
    }

    /// Returns the headers to send, `authorization` included unless the
    /// client was built with `no_sign_request`.
    ///
    /// `digest` is Hash(RequestPayload), `md5` the base64 Content-MD5.
    pub fn sign(
        &mut self,
        url: &Url,
        digest: &[u8],
        md5: Option<&str>,
        length: Option<usize>,
        custom_headers: Option<BTreeMap<&str, &str>>,
    ) -> BTreeMap<String, String> {
        let current_date = self.datetime.format("%Y%m%d").to_string();
        let current_datetime = self.datetime.format("%Y%m%dT%H%M%SZ").to_string();
        let digest = write_hex_bytes(digest);

        self.add_header("host", &host(url));
        self.add_header("user-agent", APP_USER_AGENT);
        self.add_header("x-amz-date", &current_datetime);
        self.add_header("x-amz-content-sha256", &digest);

        if let Some(length) = length {
            self.add_header("content-length", &length.to_string());
        }

        if let Some(md5) = md5 {
            self.add_header("content-md5", md5);
        }

        if let Some(custom_headers) = custom_headers {
            for (k, v) in custom_headers {
                self.add_header(k, v);
            }
        }

        if self.s3.no_sign_request() {
            return self.headers.clone();
        }

        let signed_headers = signed_headers(&self.headers);

        // 1. Create a canonical request for Signature Version 4
        //
        //     CanonicalRequest =
        //         HTTPRequestMethod + '\n' +
        //         CanonicalURI + '\n' +
        //         CanonicalQueryString + '\n' +
        //         CanonicalHeaders + '\n' +
        //         SignedHeaders + '\n' +
        //         HexEncode(Hash(RequestPayload))
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method.as_str(),
            canonical_uri(url),
            canonical_query_string(url),
            canonical_headers(&self.headers),
            signed_headers,
            digest
        );

        log::trace!("canonical request:\n{canonical_request}");

        // 2. Create a string to sign for Signature Version 4
        let scope = format!(
            "{}/{}/{}/aws4_request",
            current_date,
            self.s3.region().name(),
            self.service
        );
        let string_to_sign = string_to_sign(
            &current_datetime,
            &scope,
            &write_hex_bytes(sha256_digest(&canonical_request).as_ref()),
        );

        // 3. Calculate the signature for AWS Signature Version 4
        let signing_key = signature_key(
            self.s3.credentials().aws_secret_access_key(),
            &current_date,
            self.s3.region().name(),
            self.service,
        );
        let signature = sha256_hmac(signing_key.as_ref(), string_to_sign.as_bytes());

        // 4. Add the signature to the HTTP request
        let authorization_header = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.s3.credentials().aws_access_key_id(),
            scope,
            signed_headers,
            write_hex_bytes(signature.as_ref())
        );
        self.add_header("authorization", &authorization_header);

        self.headers.clone()
    }

    pub fn add_header(&mut self, key: &str, value: &str) {
        self.headers
            .insert(key.to_ascii_lowercase(), value.trim().to_string());
    }
}

fn host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    url.port()
        .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"))
}

// CanonicalURI is the URI-encoded version of the absolute path component of the URI, the "/"
// separators are not encoded. Segments are decoded first since `Url` already escaped them.
#[must_use]
pub fn canonical_uri(uri: &Url) -> String {
    let encoded = uri
        .path_segments()
        .map(|segments| {
            segments
                .map(|segment| {
                    let decoded = percent_decode_str(segment).decode_utf8_lossy();
                    utf8_percent_encode(&decoded, UNRESERVED).to_string()
                })
                .collect::<Vec<String>>()
                .join("/")
        })
        .unwrap_or_default();
    format!("/{encoded}")
}

// CanonicalQueryString specifies the URI-encoded query string parameters. You URI-encode name and
// values individually. You must also sort the parameters in the canonical query string
// alphabetically by key name. The sorting occurs after encoding.
#[must_use]
pub fn canonical_query_string(uri: &Url) -> String {
    let mut pairs = uri
        .query_pairs()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(&key, UNRESERVED),
                utf8_percent_encode(&value, UNRESERVED)
            )
        })
        .collect::<Vec<String>>();
    pairs.sort();
    pairs.join("&")
}

fn canonical_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(key, value)| format!("{key}:{value}\n"))
        .collect()
}

// Create a string to sign for Signature Version 4
// https://docs.aws.amazon.com/general/latest/gr/sigv4-create-string-to-sign.html
#[must_use]
pub fn string_to_sign(timestamp: &str, scope: &str, hashed_canonical_request: &str) -> String {
    format!("AWS4-HMAC-SHA256\n{timestamp}\n{scope}\n{hashed_canonical_request}")
}

fn signed_headers(headers: &BTreeMap<String, String>) -> String {
    headers.keys().map(String::as_str).collect::<Vec<&str>>().join(";")
}

fn signature_key(secret_access_key: &str, date: &str, region: &str, service: &str) -> hmac::Tag {
    let k_date = sha256_hmac(
        format!("AWS4{secret_access_key}").as_bytes(),
        date.as_bytes(),
    );
    let k_region = sha256_hmac(k_date.as_ref(), region.as_bytes());
    let k_service = sha256_hmac(k_region.as_ref(), service.as_bytes());
    sha256_hmac(k_service.as_ref(), b"aws4_request")
}
