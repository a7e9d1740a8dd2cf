//! Request interception
//!
//! ```text
//! NOT_MULTIPART -> PASSTHROUGH
//! MULTIPART -> DECODING -> (CLASSIFY -> [UPLOAD] -> ACCUMULATE)* -> MERGE -> FORWARD
//! ```
//!
//! Any failure while decoding or uploading ends in a 500 and the next handler
//! is never called, so partial file metadata never reaches it.

use crate::{
    config::{Config, PrefixFn},
    error::{Error, Result, Stage},
    form::FormValues,
    part::{self, PartKind},
    s3::{
        S3,
        limits::{MAX_PART_SIZE_BYTES, MIN_PART_SIZE_BYTES},
    },
    store::{BucketStatus, ObjectStore, PutOptions},
    upload::{default_prefix, object_key, upload_file},
};
use anyhow::anyhow;
use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use http::{
    HeaderMap, StatusCode,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use log::{Level, Log, Metadata, Record};
use multer::{Field, Multipart};
use std::{fmt, sync::Arc};
use tokio_util::sync::CancellationToken;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Forwards to whatever logger the `log` facade has installed
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLogger;

impl Log for DefaultLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            log::logger().log(record);
        }
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

pub struct Wrapper<S = S3> {
    store: S,
    options: PutOptions,
    prefix: PrefixFn,
    logger: Arc<dyn Log>,
}

impl Wrapper<S3> {
    /// Build the S3 client from `config.host`, or the `AWS_*` environment,
    /// and provision the bucket.
    ///
    /// # Errors
    ///
    /// [`Stage::Config`] for a missing bucket or client settings,
    /// [`Stage::BucketSetup`] if the bucket can not be created.
    pub async fn new(config: Config) -> Result<Self> {
        if config.bucket.is_empty() {
            return Err(Error::new(Stage::Config, anyhow!("bucket name is required")));
        }

        let s3 = config
            .host
            .clone()
            .unwrap_or_default()
            .s3(&config.bucket)
            .map_err(|e| Error::new(Stage::Config, e))?;

        Self::with_store(s3, config).await
    }
}

impl<S: ObjectStore> Wrapper<S> {
    /// Use an existing store, `config.host` is ignored.
    ///
    /// # Errors
    ///
    /// [`Stage::Config`] if the bucket is missing or does not match the
    /// store's, [`Stage::BucketSetup`] if the bucket can not be created.
    pub async fn with_store(store: S, config: Config) -> Result<Self> {
        if config.bucket.is_empty() {
            return Err(Error::new(Stage::Config, anyhow!("bucket name is required")));
        }

        if store.bucket() != config.bucket {
            return Err(Error::new(
                Stage::Config,
                anyhow!(
                    "store bucket {:?} does not match configured bucket {:?}",
                    store.bucket(),
                    config.bucket
                ),
            ));
        }

        let logger = config
            .logger
            .unwrap_or_else(|| Arc::new(DefaultLogger) as Arc<dyn Log>);

        let max_part_size = usize::try_from(MAX_PART_SIZE_BYTES).unwrap_or(usize::MAX);

        let wrapper = Self {
            store,
            options: PutOptions {
                acl: config.file_acl,
                part_size: config.part_size.clamp(MIN_PART_SIZE_BYTES, max_part_size),
                max_requests: config.max_requests.max(1),
            },
            prefix: config
                .prefix
                .unwrap_or_else(|| Arc::new(default_prefix) as PrefixFn),
            logger,
        };

        if config.create_bucket {
            wrapper.setup_bucket(&config.bucket_acl).await?;
        }

        wrapper.log(
            Level::Debug,
            format_args!(
                "bucket: {}, part size: {}, max requests: {}",
                config.bucket, wrapper.options.part_size, wrapper.options.max_requests
            ),
        );

        Ok(wrapper)
    }

    async fn setup_bucket(&self, acl: &str) -> Result<()> {
        match self.store.create_bucket(acl).await {
            Ok(BucketStatus::Created) => {
                self.log(
                    Level::Info,
                    format_args!("bucket {} created", self.store.bucket()),
                );
                Ok(())
            }
            Ok(BucketStatus::AlreadyOwned) => {
                self.log(
                    Level::Debug,
                    format_args!("bucket {} already owned", self.store.bucket()),
                );
                Ok(())
            }
            Err(e) => Err(Error::new(
                Stage::BucketSetup,
                e.context(format!("creating bucket {}", self.store.bucket())),
            )),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn options(&self) -> &PutOptions {
        &self.options
    }

    /// Stream every file part of a multipart request to the store and
    /// return the request with its [`FormValues`] extension populated and an
    /// empty body. Other requests are returned untouched.
    ///
    /// The upload is bound to the [`CancellationToken`] found in the request
    /// extensions, if any.
    ///
    /// # Errors
    ///
    /// [`Stage::Decode`] or [`Stage::Upload`], nothing is merged into the
    /// request in that case.
    pub async fn process(&self, req: Request) -> Result<Request> {
        if !is_multipart(req.headers()) {
            return Ok(req);
        }

        let (mut parts, body) = req.into_parts();

        let boundary = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(multer::parse_boundary)
            .unwrap_or(Err(multer::Error::NoBoundary))
            .map_err(|e| Error::new(Stage::Decode, e))?;

        let cancel = parts
            .extensions
            .get::<CancellationToken>()
            .cloned()
            .unwrap_or_default();

        let prefix = (self.prefix)(&parts);

        let mut multipart = Multipart::new(body.into_data_stream(), boundary);
        let mut values = FormValues::new();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::new(Stage::Decode, e))?
        {
            let kind = part::classify(field.name(), field.file_name());

            let result = self
                .read_part(&mut field, kind, &prefix, &cancel, &mut values)
                .await;

            self.close(&mut field, &cancel).await;

            result?;
        }

        // MERGE, after the query string or values set by an outer layer
        let mut merged = parts.extensions.remove::<FormValues>().unwrap_or_else(|| {
            FormValues::from_query(parts.uri.query().unwrap_or_default())
        });
        merged.extend(values);
        parts.extensions.insert(merged);

        parts.headers.remove(CONTENT_LENGTH);

        Ok(Request::from_parts(parts, Body::empty()))
    }

    async fn read_part(
        &self,
        field: &mut Field<'_>,
        kind: PartKind,
        prefix: &str,
        cancel: &CancellationToken,
        values: &mut FormValues,
    ) -> Result<()> {
        match kind {
            PartKind::Field { name } => {
                let value = part::read_text(field)
                    .await
                    .map_err(|e| Error::new(Stage::Decode, e))?;
                values.append(name, value);
            }
            PartKind::File { name, filename } => {
                let key = object_key(prefix);
                let file = upload_file(
                    &self.store,
                    &self.options,
                    key,
                    &filename,
                    part::reader(field),
                    cancel,
                )
                .await?;

                self.log(
                    Level::Info,
                    format_args!(
                        "{name}: {} ({}, {} bytes) stored as {}",
                        file.filename, file.content_type, file.size, file.key
                    ),
                );

                values.push_file(&name, &file);
            }
        }

        Ok(())
    }

    // drain what is left of the part, failures are only logged
    async fn close(&self, field: &mut Field<'_>, cancel: &CancellationToken) {
        let drained = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            rs = part::drain(field) => rs,
        };

        if let Err(e) = drained {
            let err = Error::new(Stage::Close, e);
            self.log(Level::Warn, format_args!("{err}"));
        }
    }

    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.logger.log(
            &Record::builder()
                .level(level)
                .target(module_path!())
                .args(args)
                .build(),
        );
    }

    /// Apply the middleware to every route of `router`
    pub fn wrap<T>(self: Arc<Self>, router: Router<T>) -> Router<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self, intercept::<S>))
    }
}

impl<S> fmt::Debug for Wrapper<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// axum middleware, see [`Wrapper::wrap`]
pub async fn intercept<S: ObjectStore>(
    State(wrapper): State<Arc<Wrapper<S>>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    match wrapper.process(req).await {
        Ok(req) => next.run(req).await,
        Err(e) => {
            wrapper.log(Level::Error, format_args!("{method} {uri}: {e}"));

            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, status.canonical_reason().unwrap_or_default()).into_response()
        }
    }
}

/// `Content-Type` starts with `multipart/form-data`, ignoring case
#[must_use]
pub fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.as_bytes().get(..MULTIPART_FORM_DATA.len()))
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MULTIPART_FORM_DATA.as_bytes()))
}
