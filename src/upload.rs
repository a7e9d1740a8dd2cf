//! Upload pipeline
//!
//! One call per file part: clean the filename, put the part body behind a
//! [`Sniffer`] and hand it to the store under a fresh key. The descriptor is
//! only built once the store accepted the whole stream.

use crate::{
    error::{Error, Result, Stage},
    part::clean_filename,
    sniff::{Sniffer, UNKNOWN_TYPE},
    store::{ObjectStore, PutOptions},
};
use anyhow::{Context, anyhow};
use chrono::Utc;
use http::request::Parts;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What the downstream handler gets to know about an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub filename: String,
    pub content_type: String,
    pub key: String,
    pub size: u64,
}

/// `/YYYY/MM/DD/` in UTC
#[must_use]
pub fn default_prefix(_parts: &Parts) -> String {
    Utc::now().format("/%Y/%m/%d/").to_string()
}

/// `prefix` followed by a random v4 UUID
#[must_use]
pub fn object_key(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4())
}

/// Map a filename extension to a MIME type, `None` if unknown
#[must_use]
pub fn guess_type(filename: &str) -> Option<&'static str> {
    mime_guess::from_path(filename).first_raw()
}

/// Stream `source` to `store` under `key`.
///
/// The upload races `cancel`, a cancelled token drops the in-flight upload.
///
/// # Errors
///
/// [`Stage::Decode`] when reading the part body failed, [`Stage::Upload`] for
/// store failures and cancellation.
pub async fn upload_file<S, R>(
    store: &S,
    options: &PutOptions,
    key: String,
    declared_filename: &str,
    source: R,
    cancel: &CancellationToken,
) -> Result<FileDescriptor>
where
    S: ObjectStore,
    R: AsyncRead + Unpin + Send,
{
    let filename = clean_filename(declared_filename);
    let mut sniffer = Sniffer::new(source);

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(anyhow!("request cancelled")),
        rs = store.put_stream(&key, &mut sniffer, options) => rs,
    };

    if let Err(e) = result {
        let stage = if sniffer.source_failed() {
            Stage::Decode
        } else {
            Stage::Upload
        };

        return Err(Error::new(
            stage,
            e.context(format!("uploading {filename} to {key}")),
        ));
    }

    let size = sniffer.count();
    let mut content_type = sniffer.finish();

    if content_type == UNKNOWN_TYPE {
        content_type = guess_type(&filename).unwrap_or(UNKNOWN_TYPE);
    }

    log::debug!("uploaded {filename} ({content_type}, {size} bytes) to {key}");

    Ok(FileDescriptor {
        filename,
        content_type: content_type.to_string(),
        key,
        size,
    })
}

/// Confirm an uploaded key exists in the store
///
/// # Errors
///
/// [`Stage::Upload`] if the store can not be queried or the key is missing
pub async fn verify<S: ObjectStore>(store: &S, key: &str) -> Result<()> {
    store
        .head_object(key)
        .await
        .and_then(|found| found.map(|_| ()).with_context(|| format!("{key} not found")))
        .map_err(|e| Error::new(Stage::Upload, e))
}
