use std::error::Error as StdError;
use std::fmt;

/// Pipeline step an [`Error`] comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    BucketSetup,
    Decode,
    Upload,
    Close,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::BucketSetup => "bucket-setup",
            Self::Decode => "decode",
            Self::Upload => "upload",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error tagged with the [`Stage`] that produced it, match on
/// [`Error::stage`] instead of the message.
#[derive(Debug)]
pub struct Error {
    stage: Stage,
    source: anyhow::Error,
}

impl Error {
    pub fn new(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub const fn cause(&self) -> &anyhow::Error {
        &self.source
    }

    #[must_use]
    pub fn into_cause(self) -> anyhow::Error {
        self.source
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {:#}", self.stage, self.source)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let source: &(dyn StdError + 'static) = self.source.as_ref();
        Some(source)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
