//! # s3form
//!
//! axum middleware that streams the file parts of `multipart/form-data`
//! requests straight into an S3 bucket. The downstream handler receives the
//! remaining form fields plus, for every file field `F`, the values `F`
//! (object key), `F_name`, `F_type` and `F_size` in [`FormValues`].
//!
//! ```no_run
//! use axum::{Json, Router, routing::post};
//! use s3form::{Config, FormValues, Wrapper};
//! use std::sync::Arc;
//!
//! # async fn run() -> s3form::Result<()> {
//! let wrapper = Arc::new(Wrapper::new(Config::new("uploads")).await?);
//! let app: Router = wrapper.wrap(Router::new().route(
//!     "/upload",
//!     post(|form: FormValues| async move { Json(form) }),
//! ));
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod form;
pub mod part;
pub mod s3;
pub mod sniff;
pub mod store;
pub mod stream;
pub mod upload;
pub mod wrapper;

pub use self::{
    config::{Config, Host, PrefixFn, Settings},
    error::{Error, Result, Stage},
    form::FormValues,
    store::{BucketStatus, ObjectStore, PutOptions},
    upload::FileDescriptor,
    wrapper::{DefaultLogger, Wrapper, intercept},
};
