use std::{env, error, fmt, io, path::PathBuf, result, time::Duration};

use source::{FileZoneSource, HttpZoneSource, ZoneSource};

pub mod repo;
pub mod source;

pub use repo::ZoneRepo;

#[derive(Debug)]
pub enum StoreError {
    /// Neither the source nor the cache could provide any zones.
    Unavailable,
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

impl StoreError {
    pub fn other<T: error::Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "no service zones available"),
            StoreError::NotFound => write!(f, "service zone not found"),
            StoreError::Other(why) => write!(f, "{}", why),
        }
    }
}

impl error::Error for StoreError {}

impl From<reqwest::Error> for StoreError {
    fn from(why: reqwest::Error) -> Self {
        Self::other(why)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(why: serde_json::Error) -> Self {
        Self::other(why)
    }
}

impl From<io::Error> for StoreError {
    fn from(why: io::Error) -> Self {
        Self::other(why)
    }
}

pub type StoreResult<T> = result::Result<T, StoreError>;

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub source: SourceLocation,
    pub cache_file: Option<PathBuf>,
    pub source_timeout: Duration,
}

impl StoreConfig {
    /// Reads `ZONE_SOURCE_URL` (or, if unset, `ZONE_SOURCE_FILE`), the
    /// optional `ZONE_CACHE_FILE` and `ZONE_SOURCE_TIMEOUT_SECS`.
    pub fn from_env() -> Option<Self> {
        let source = env::var("ZONE_SOURCE_URL")
            .ok()
            .map(SourceLocation::Url)
            .or_else(|| {
                env::var("ZONE_SOURCE_FILE")
                    .ok()
                    .map(|path| SourceLocation::File(path.into()))
            })?;
        let cache_file = env::var("ZONE_CACHE_FILE").ok().map(PathBuf::from);
        let source_timeout = env::var("ZONE_SOURCE_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SOURCE_TIMEOUT);
        Some(Self {
            source,
            cache_file,
            source_timeout,
        })
    }

    pub fn into_repo(self) -> StoreResult<ZoneRepo<Box<dyn ZoneSource>>> {
        let source: Box<dyn ZoneSource> = match self.source {
            SourceLocation::Url(url) => {
                Box::new(HttpZoneSource::new(url, self.source_timeout)?)
            }
            SourceLocation::File(path) => Box::new(FileZoneSource::new(path)),
        };
        let repo = ZoneRepo::new(source);
        Ok(match self.cache_file {
            Some(path) => repo.with_cache_file(path),
            None => repo,
        })
    }
}
