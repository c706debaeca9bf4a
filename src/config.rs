use crate::errors::{CacheError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const PROTEIN_CACHE_FILE_NAME: &str = "proteinCache.txt";
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub path: PathBuf,
    /// Number of new proteins queued before an automatic flush.
    pub buffer_size: usize,
}

/// Cache settings as read from JSON; missing fields take their defaults.
#[derive(Debug, Deserialize)]
pub struct Input {
    path: Option<PathBuf>,
    directory: Option<PathBuf>,
    buffer_size: Option<usize>,
}

impl CacheConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn in_directory<P: AsRef<Path>>(directory: P) -> Self {
        Self::new(directory.as_ref().join(PROTEIN_CACHE_FILE_NAME))
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = if buffer_size == 0 {
            log::warn!("buffer_size of 0 would never flush, using 1");
            1
        } else {
            buffer_size
        };
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let input: Input = serde_json::from_str(json)?;
        input.build()
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CacheError::io(path.as_ref(), e))?;
        Self::from_json(&json)
    }
}

impl Input {
    pub fn build(self) -> Result<CacheConfig> {
        let config = match (self.path, self.directory) {
            (Some(path), None) => CacheConfig::new(path),
            (None, Some(directory)) => CacheConfig::in_directory(directory),
            (None, None) => CacheConfig::new(PROTEIN_CACHE_FILE_NAME),
            (Some(_), Some(_)) => {
                return Err(CacheError::InvalidConfig(
                    "`path` and `directory` are mutually exclusive".into(),
                ))
            }
        };
        Ok(config.with_buffer_size(self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)))
    }
}
