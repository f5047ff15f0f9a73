//! Persistence: one JSON file per collection, holding a JSON array of records.
//!
//! A [`JsonStore`] always reads and writes the whole file. There is no partial-write
//! protection; a crash mid-write can leave a truncated file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reading, parsing, or writing a collection file.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode records for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed collection. Load on demand; save after every mutation.
#[derive(Clone, Debug)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file and parses it as a JSON array of `T`.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        serde_json::from_str(&data).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Serializes `records` and overwrites the file.
    pub async fn save<T: Serialize>(&self, records: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(records).map_err(|source| StorageError::Encode {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| self.io_error(source))
    }

    /// Creates the file as an empty array (and its parent directories) if it does not exist.
    /// Returns `true` when a new file was written. Existing files are left as they are.
    pub async fn ensure_exists(&self) -> Result<bool, StorageError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }
        tokio::fs::write(&self.path, "[]")
            .await
            .map_err(|source| self.io_error(source))?;
        Ok(true)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
