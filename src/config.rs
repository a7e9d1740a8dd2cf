use crate::s3::{Credentials, Region, S3, limits::MIN_PART_SIZE_BYTES};
use anyhow::{Context, Result};
use http::request::Parts;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::{fmt, fs::File, path::Path, sync::Arc};

/// Builds the key prefix for a request, the object key is the prefix
/// followed by a random UUID.
pub type PrefixFn = Arc<dyn Fn(&Parts) -> String + Send + Sync>;

/// Middleware configuration, only `bucket` is required
#[derive(Clone)]
pub struct Config {
    // endpoint and credentials, defaults to the AWS_* environment
    pub host: Option<Host>,
    pub bucket: String,
    pub bucket_acl: String,
    pub create_bucket: bool,
    pub file_acl: String,
    // raised to MIN_PART_SIZE_BYTES when lower
    pub part_size: usize,
    // concurrent UploadPart requests per file
    pub max_requests: usize,
    // defaults to the UTC date, /YYYY/MM/DD/
    pub prefix: Option<PrefixFn>,
    // defaults to the `log` global logger
    pub logger: Option<Arc<dyn log::Log>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            bucket: String::new(),
            bucket_acl: "private".to_string(),
            create_bucket: true,
            file_acl: "private".to_string(),
            part_size: MIN_PART_SIZE_BYTES,
            max_requests: 1,
            prefix: None,
            logger: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    #[must_use]
    pub fn with_prefix<F>(mut self, prefix: F) -> Self
    where
        F: Fn(&Parts) -> String + Send + Sync + 'static,
    {
        self.prefix = Some(Arc::new(prefix));
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn log::Log>) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("bucket", &self.bucket)
            .field("bucket_acl", &self.bucket_acl)
            .field("create_bucket", &self.create_bucket)
            .field("file_acl", &self.file_acl)
            .field("part_size", &self.part_size)
            .field("max_requests", &self.max_requests)
            .field("prefix", &self.prefix.as_ref().map(|_| "fn"))
            .field("logger", &self.logger.as_ref().map(|_| "dyn Log"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Host {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    #[serde(default, deserialize_with = "secret_deserializer")]
    pub secret_key: Option<SecretString>,
    #[serde(default)]
    pub no_sign_request: bool,
}

/// # Errors
///
/// Will return `Err` if can't deserialize
fn secret_deserializer<'de, D>(d: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.map(SecretString::from))
}

impl Host {
    /// Region for the host, a custom endpoint wins over the region name
    ///
    /// # Errors
    ///
    /// Will return `Err` if the region is not a valid AWS region
    pub fn get_region(&self) -> Result<Region> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(Region::Custom {
                name: self
                    .region
                    .clone()
                    .unwrap_or_else(|| "us-east-1".to_string()),
                endpoint: endpoint.clone(),
            });
        }

        if let Some(region) = &self.region {
            return Ok(region.parse::<Region>()?);
        }

        if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL") {
            let default = Region::default();
            return Ok(Region::Custom {
                name: default.name().to_string(),
                endpoint,
            });
        }

        Ok(Region::default())
    }

    /// Credentials from the host, or `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`
    ///
    /// # Errors
    ///
    /// Will return `Err` if no credentials are available
    pub fn get_credentials(&self) -> Result<Credentials> {
        match (&self.access_key, &self.secret_key) {
            (Some(key), Some(secret)) => Ok(Credentials::new(key, secret)),
            _ if self.no_sign_request => {
                Ok(Credentials::new("", &SecretString::from(String::new())))
            }
            _ => Credentials::from_env(),
        }
    }

    /// # Errors
    ///
    /// Will return `Err` if the region or the credentials can not be resolved
    pub fn s3(&self, bucket: &str) -> Result<S3> {
        let region = self.get_region()?;
        let credentials = self.get_credentials()?;

        Ok(S3::new(
            &credentials,
            &region,
            Some(bucket.to_string()),
            self.no_sign_request,
        ))
    }
}

/// YAML configuration file
#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub host: Option<Host>,
    pub bucket: String,
    pub bucket_acl: Option<String>,
    pub create_bucket: Option<bool>,
    pub file_acl: Option<String>,
    pub part_size: Option<usize>,
    pub max_requests: Option<usize>,
}

impl Settings {
    /// # Errors
    ///
    /// Will return `Err` if the file can not be read or parsed
    pub fn new(config_path: &Path) -> Result<Self> {
        let file = File::open(config_path)
            .with_context(|| format!("unable to open {}", config_path.display()))?;

        let settings: Self =
            serde_yaml_ng::from_reader(file).context("unable to parse config file")?;

        Ok(settings)
    }

    #[must_use]
    pub fn into_config(self) -> Config {
        let default = Config::default();

        Config {
            host: self.host,
            bucket: self.bucket,
            bucket_acl: self.bucket_acl.unwrap_or(default.bucket_acl),
            create_bucket: self.create_bucket.unwrap_or(default.create_bucket),
            file_acl: self.file_acl.unwrap_or(default.file_acl),
            part_size: self.part_size.unwrap_or(default.part_size),
            max_requests: self.max_requests.unwrap_or(default.max_requests),
            prefix: None,
            logger: None,
        }
    }
}
