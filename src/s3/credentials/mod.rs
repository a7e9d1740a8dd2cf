use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::env;

#[derive(Clone, Debug)]
pub struct Credentials {
    // AWS_ACCESS_KEY_ID
    key: String,
    // AWS_SECRET_ACCESS_KEY
    secret: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(access: &str, secret: &SecretString) -> Self {
        Self {
            key: access.to_string(),
            secret: secret.clone(),
        }
    }

    /// Read the keys from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`
    ///
    /// # Errors
    ///
    /// Will return `Err` if any of the variables is missing
    pub fn from_env() -> Result<Self> {
        let key = env::var("AWS_ACCESS_KEY_ID").context("missing AWS_ACCESS_KEY_ID")?;
        let secret = env::var("AWS_SECRET_ACCESS_KEY").context("missing AWS_SECRET_ACCESS_KEY")?;
        Ok(Self {
            key,
            secret: SecretString::from(secret),
        })
    }

    /// Get a reference to the access key ID.
    #[must_use]
    pub fn aws_access_key_id(&self) -> &str {
        &self.key
    }

    /// Get a reference to the secret access key.
    #[must_use]
    pub fn aws_secret_access_key(&self) -> &str {
        self.secret.expose_secret()
    }
}
