use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

// https://docs.aws.amazon.com/general/latest/gr/rande.html#regional-endpoints
const AWS_REGIONS: &[&str] = &[
    "af-south-1",
    "ap-east-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ca-central-1",
    "cn-north-1",
    "cn-northwest-1",
    "eu-central-1",
    "eu-central-2",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "il-central-1",
    "me-central-1",
    "me-south-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    // one of AWS_REGIONS
    Aws { name: String },

    // Custom region, endpoint (MinIO, Ceph, Backblaze, ...)
    Custom { name: String, endpoint: String },
}

impl Region {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Aws { name } | Self::Custom { name, .. } => name,
        }
    }

    /// Host (and port) of the service, without scheme
    #[must_use]
    pub fn endpoint(&self) -> String {
        match self {
            Self::Aws { name } if name.starts_with("cn-") => {
                format!("s3.{name}.amazonaws.com.cn")
            }
            Self::Aws { name } => format!("s3.{name}.amazonaws.com"),
            Self::Custom { endpoint, .. } => endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Endpoint with scheme, custom endpoints keep the one they were given
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        match self {
            Self::Custom { endpoint, .. }
                if endpoint.starts_with("http://") || endpoint.starts_with("https://") =>
            {
                endpoint.trim_end_matches('/').to_string()
            }
            _ => format!("https://{}", self.endpoint()),
        }
    }
}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        if AWS_REGIONS.contains(&name.as_str()) {
            Ok(Self::Aws { name })
        } else {
            Err(ParseRegionError::new(s))
        }
    }
}

/// An error produced when attempting to convert a `str` into a `Region` fails.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseRegionError {
    message: String,
}

impl ParseRegionError {
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            message: format!("Not a valid AWS region: {input}"),
        }
    }
}

impl Error for ParseRegionError {}

impl Display for ParseRegionError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.message)
    }
}

impl Default for Region {
    fn default() -> Self {
        match std::env::var("AWS_REGION").or_else(|_| std::env::var("AWS_DEFAULT_REGION")) {
            Ok(ref v) => Self::from_str(v).unwrap_or_else(|_| Self::Aws {
                name: "us-east-1".to_string(),
            }),
            Err(_) => Self::Aws {
                name: "us-east-1".to_string(),
            },
        }
    }
}
