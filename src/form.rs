//! Form reconstructor
//!
//! [`FormValues`] is the ordered multi-valued map handed to the downstream
//! handler. Every key keeps its values in arrival order, so for a file field
//! `F` the i-th entries of `F`, `F_name`, `F_type` and `F_size` always
//! describe the same file.

use crate::upload::FileDescriptor;
use axum::extract::FromRequestParts;
use http::request::Parts;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, convert::Infallible};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, Vec<String>>);

impl FormValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` string (URI query)
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut values = Self::new();
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            values.append(k, v);
        }
        values
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Add the four entries describing an uploaded file under `field`
    pub fn push_file(&mut self, field: &str, file: &FileDescriptor) {
        self.append(field, file.key.as_str());
        self.append(format!("{field}_name"), file.filename.as_str());
        self.append(format!("{field}_type"), file.content_type.as_str());
        self.append(format!("{field}_size"), file.size.to_string());
    }

    /// Append all values of `other` after the existing ones
    pub fn extend(&mut self, other: Self) {
        for (key, values) in other.0 {
            self.0.entry(key).or_default().extend(values);
        }
    }

    /// First value of `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl From<BTreeMap<String, Vec<String>>> for FormValues {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

/// Values stored by the middleware, or the parsed query string when the
/// request was not intercepted.
impl<S> FromRequestParts<S> for FormValues
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            Self::from_query(parts.uri.query().unwrap_or_default())
        }))
    }
}
