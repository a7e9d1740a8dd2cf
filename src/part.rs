//! Part classifier
//!
//! Decides from the headers alone whether a multipart section is a file or a
//! plain field, and owns the helpers that read and close a section.

use futures::TryStreamExt;
use multer::Field;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

/// Name used when the declared filename has nothing left after cleaning
pub const UNNAMED: &str = "unnamed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    File { name: String, filename: String },
    Field { name: String },
}

impl PartKind {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Field { name } => name,
        }
    }
}

/// A part is a file only when it declares a non-empty filename, browsers send
/// `filename=""` for file inputs left empty.
#[must_use]
pub fn classify(name: Option<&str>, file_name: Option<&str>) -> PartKind {
    let name = name.unwrap_or_default().to_string();

    match file_name {
        Some(filename) if !filename.is_empty() => PartKind::File {
            name,
            filename: filename.to_string(),
        },
        _ => PartKind::Field { name },
    }
}

/// Keep only the last path component of a client supplied filename
#[must_use]
pub fn clean_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    match base {
        "" | "." | ".." => UNNAMED.to_string(),
        name => name.to_string(),
    }
}

/// Body of a field part as text, invalid UTF-8 is replaced
///
/// # Errors
///
/// Will return `Err` if the multipart stream fails
pub async fn read_text(field: &mut Field<'_>) -> Result<String, multer::Error> {
    let mut data = Vec::new();

    while let Some(chunk) = field.chunk().await? {
        data.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Consume whatever is left of the part, returns the bytes skipped
///
/// # Errors
///
/// Will return `Err` if the multipart stream fails
pub async fn drain(field: &mut Field<'_>) -> Result<u64, multer::Error> {
    let mut skipped = 0;

    while let Some(chunk) = field.chunk().await? {
        skipped += chunk.len() as u64;
    }

    Ok(skipped)
}

/// Body of a file part as an `AsyncRead`
pub fn reader<'a>(field: &'a mut Field<'_>) -> impl AsyncRead + Unpin + Send + 'a {
    StreamReader::new(field.map_err(io::Error::other))
}
