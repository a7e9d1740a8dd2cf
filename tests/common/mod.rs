//! Common test helpers for integration tests
//!
//! - `MemoryStore`: in-memory `ObjectStore` that counts calls and can fail on demand
//! - `Form`: builds `multipart/form-data` bodies
//! - `Capture`: logger that keeps every record
//! - `MinioContext`: `MinIO` test environment (external or container-based)

#![allow(dead_code, clippy::indexing_slicing, clippy::unwrap_used, clippy::expect_used)]

mod helpers;

pub use helpers::minio::{MINIO_ROOT_PASSWORD, MINIO_ROOT_USER, MinioContainer};

use anyhow::anyhow;
use log::{Level, Log, Metadata, Record};
use s3form::{BucketStatus, ObjectStore, PutOptions};
use std::{
    collections::BTreeMap,
    env,
    fmt::Write as _,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use tokio::io::{AsyncRead, AsyncReadExt};

pub const BOUNDARY: &str = "s3form-test-boundary";

#[derive(Default)]
struct State {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    owned: AtomicBool,
    creates: AtomicUsize,
    heads: AtomicUsize,
    puts: AtomicUsize,
}

/// Clones share the same objects and counters
#[derive(Clone)]
pub struct MemoryStore {
    bucket: String,
    // 1-based put_stream call that fails
    fail_on: Option<usize>,
    reject_create: bool,
    state: Arc<State>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            fail_on: None,
            reject_create: false,
            state: Arc::new(State::default()),
        }
    }

    pub fn fail_on(mut self, nth: usize) -> Self {
        self.fail_on = Some(nth);
        self
    }

    pub fn reject_create(mut self) -> Self {
        self.reject_create = true;
        self
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.state.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.objects.lock().unwrap().len()
    }

    pub fn creates(&self) -> usize {
        self.state.creates.load(Ordering::SeqCst)
    }

    pub fn heads(&self) -> usize {
        self.state.heads.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.state.puts.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.creates() + self.heads() + self.puts()
    }
}

impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_bucket(&self, _acl: &str) -> anyhow::Result<BucketStatus> {
        self.state.creates.fetch_add(1, Ordering::SeqCst);

        if self.reject_create {
            return Err(anyhow!("AccessDenied"));
        }

        if self.state.owned.swap(true, Ordering::SeqCst) {
            Ok(BucketStatus::AlreadyOwned)
        } else {
            Ok(BucketStatus::Created)
        }
    }

    async fn head_object(&self, key: &str) -> anyhow::Result<Option<BTreeMap<String, String>>> {
        self.state.heads.fetch_add(1, Ordering::SeqCst);

        let objects = self.state.objects.lock().unwrap();
        Ok(objects.get(key).map(|data| {
            let mut headers = BTreeMap::new();
            headers.insert("content-length".to_string(), data.len().to_string());
            headers
        }))
    }

    async fn put_stream<R>(
        &self,
        key: &str,
        reader: &mut R,
        _options: &PutOptions,
    ) -> anyhow::Result<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        let nth = self.state.puts.fetch_add(1, Ordering::SeqCst) + 1;

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;

        if self.fail_on == Some(nth) {
            return Err(anyhow!("store rejected {key}"));
        }

        let etag = format!("\"{:x}\"", md5::compute(&data));
        self.state
            .objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data);

        Ok(etag)
    }
}

/// `multipart/form-data` body builder
#[derive(Debug, Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn text(self, name: &str, value: &str) -> Self {
        self.part(
            &format!("Content-Disposition: form-data; name=\"{name}\""),
            value.as_bytes(),
        )
    }

    pub fn file(self, name: &str, filename: &str, content: &[u8]) -> Self {
        self.part(
            &format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream"
            ),
            content,
        )
    }

    fn part(mut self, headers: &str, content: &[u8]) -> Self {
        let mut head = String::new();
        write!(head, "--{BOUNDARY}\r\n{headers}\r\n\r\n").unwrap();
        self.body.extend_from_slice(head.as_bytes());
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// PNG signature followed by zeros
pub fn png(len: usize) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.resize(len, 0);
    data
}

/// Logger that keeps every record it gets
#[derive(Debug, Default)]
pub struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Capture {
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

/// `MinIO` test environment, either external (`MINIO_ENDPOINT`) or a
/// testcontainer
pub enum MinioContext {
    External {
        endpoint: String,
        access_key: String,
        secret_key: String,
    },
    Container(Box<MinioContainer>),
}

impl MinioContext {
    pub async fn get_or_start() -> Self {
        if let Ok(endpoint) = env::var("MINIO_ENDPOINT") {
            let access_key =
                env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| MINIO_ROOT_USER.to_string());
            let secret_key =
                env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| MINIO_ROOT_PASSWORD.to_string());

            println!("Using external MinIO at {endpoint}");

            MinioContext::External {
                endpoint,
                access_key,
                secret_key,
            }
        } else {
            println!("Starting MinIO testcontainer");
            let container = MinioContainer::start().await;
            container.wait_for_ready().await.expect("MinIO ready");
            MinioContext::Container(Box::new(container))
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            MinioContext::External { endpoint, .. } => endpoint,
            MinioContext::Container(c) => c.endpoint(),
        }
    }

    pub fn access_key(&self) -> &str {
        match self {
            MinioContext::External { access_key, .. } => access_key,
            MinioContext::Container(c) => &c.access_key,
        }
    }

    pub fn secret_key(&self) -> &str {
        match self {
            MinioContext::External { secret_key, .. } => secret_key,
            MinioContext::Container(c) => &c.secret_key,
        }
    }

    /// Host settings pointing at this `MinIO`
    pub fn host(&self) -> s3form::Host {
        s3form::Host {
            endpoint: Some(self.endpoint().to_string()),
            region: Some("us-east-1".to_string()),
            access_key: Some(self.access_key().to_string()),
            secret_key: Some(self.secret_key().to_string().into()),
            no_sign_request: false,
        }
    }
}
