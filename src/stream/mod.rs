//! Chunked upload of a stream of unknown length
//!
//! The reader is consumed one part at a time, so memory stays bounded to
//! `max_requests` parts no matter how big the object is. Objects smaller than
//! one part are sent with a single `PutObject`.

use crate::{
    s3::{
        S3, actions,
        limits::{MAX_PARTS_PER_UPLOAD, MIN_PART_SIZE_BYTES},
    },
    store::PutOptions,
};
use anyhow::{Result, bail};
use bytes::{Bytes, BytesMut};
use std::collections::BTreeMap;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    task::JoinSet,
};

// https://docs.aws.amazon.com/AmazonS3/latest/dev/UsingRESTAPImpUpload.html
// * Initiate Multipart Upload
// * Upload Part
// * Complete Multipart Upload
/// # Errors
/// Will return an error if reading the source or any request fails
pub async fn upload<R>(s3: &S3, key: &str, reader: &mut R, options: &PutOptions) -> Result<String>
where
    R: AsyncRead + Unpin + Send,
{
    let part_size = options.part_size.max(MIN_PART_SIZE_BYTES);
    let max_requests = options.max_requests.max(1);

    let first = read_chunk(reader, part_size).await?;

    // fits in one request
    if first.len() < part_size {
        log::debug!("PutObject key: {key}, bytes: {}", first.len());

        let action = actions::PutObject::new(key, first.freeze(), Some(&options.acl));
        return action.request(s3).await;
    }

    let action = actions::CreateMultipartUpload::new(key, Some(&options.acl));
    let upload_id = action.request(s3).await?.upload_id;

    log::debug!("key: {key}, upload_id: {upload_id}, part size: {part_size}");

    let mut tasks: JoinSet<Result<(u16, String)>> = JoinSet::new();
    let mut uploaded: BTreeMap<u16, actions::Part> = BTreeMap::new();
    let mut chunk = first.freeze();
    let mut number: u16 = 1;

    loop {
        log::debug!("Task push part: {number}, bytes: {}", chunk.len());

        tasks.spawn(upload_part(
            s3.clone(),
            key.to_string(),
            upload_id.clone(),
            number,
            chunk,
        ));

        // throttle
        while tasks.len() >= max_requests {
            if let Some(result) = tasks.join_next().await {
                let (n, etag) = result??;
                uploaded.insert(n, actions::Part { etag, number: n });
            }
        }

        let next = read_chunk(reader, part_size).await?;
        if next.is_empty() {
            break;
        }

        if usize::from(number) >= MAX_PARTS_PER_UPLOAD {
            bail!("object exceeds {MAX_PARTS_PER_UPLOAD} parts of {part_size} bytes");
        }

        chunk = next.freeze();
        number += 1;
    }

    log::debug!("Remaining tasks: {}", tasks.len());

    while let Some(result) = tasks.join_next().await {
        let (n, etag) = result??;
        uploaded.insert(n, actions::Part { etag, number: n });
    }

    let action = actions::CompleteMultipartUpload::new(key, &upload_id, uploaded);
    let rs = action.request(s3).await?;

    log::info!("Upload finished, key: {key}, ETag: {}", rs.e_tag);

    Ok(rs.e_tag)
}

async fn upload_part(
    s3: S3,
    key: String,
    upload_id: String,
    number: u16,
    body: Bytes,
) -> Result<(u16, String)> {
    let action = actions::UploadPart::new(&key, number, &upload_id, body);
    let etag = action.request(&s3).await?;

    log::info!("Uploaded part: {number}, etag: {etag}");

    Ok((number, etag))
}

/// Read up to `size` bytes, fewer only when the reader reached EOF
///
/// # Errors
/// Will return an error if the reader fails
pub async fn read_chunk<R>(reader: &mut R, size: usize) -> std::io::Result<BytesMut>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(size);
    let mut limited = reader.take(u64::try_from(size).unwrap_or(u64::MAX));

    while limited.read_buf(&mut buf).await? > 0 {}

    Ok(buf)
}
