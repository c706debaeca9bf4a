use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "range {offset}..{offset}+{length} is outside protein {index} (length {sequence_length})"
    )]
    OutOfRange {
        index: u32,
        offset: usize,
        length: usize,
        sequence_length: usize,
    },
    #[error("no protein with index {0} in the cache")]
    UnknownIndex(u32),
    #[error("protein {0} was stored without a sequence")]
    MissingSequence(u32),
    #[error("no description for PTM code {0:?}")]
    UnknownPtm(String),
    #[error("{field} contains a tab or newline: {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("cache lock poisoned by a panicked thread")]
    Poisoned,
    #[error("cache is full, no index left after {0} proteins")]
    CapacityExceeded(usize),
    #[error("protein {index} is cached but could not be written: {source}")]
    Unflushed {
        index: u32,
        #[source]
        source: Box<CacheError>,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

impl CacheError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for CacheError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}
