//! Error types for every stage of the offer pipeline.
//!
//! Only [`PipelineError`] stops a run. The others are produced by individual
//! components and are either promoted to a [`PipelineError`] (store failures)
//! or recorded in the run report and skipped (payload and write failures).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading or writing the offer store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("offer store not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("offer store {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to access offer store {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// A record's embedded solution payload could not be parsed.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("solution payload is malformed: {reason}")]
    Malformed { reason: String },
}

/// Failures while persisting one rendered page.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("permission denied writing {}", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("no space left writing {}", .path.display())]
    DiskFull { path: PathBuf },

    #[error("path collision at {}: {detail}", .path.display())]
    PathCollision { path: PathBuf, detail: String },

    #[error("page path {relative:?} escapes the output directory")]
    InvalidPath { relative: String },

    #[error("failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl WriteError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                WriteError::PermissionDenied { path }
            }
            io::ErrorKind::StorageFull => WriteError::DiskFull { path },
            io::ErrorKind::IsADirectory
            | io::ErrorKind::AlreadyExists
            | io::ErrorKind::NotADirectory => WriteError::PathCollision {
                path,
                detail: source.to_string(),
            },
            _ => WriteError::Io { path, source },
        }
    }
}

/// Site configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Failures of the lead harvester for a single source.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid listing URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("request timed out: {0}")]
    Timeout(reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected listing body: {0}")]
    Body(#[from] serde_json::Error),
}

impl From<reqwest::Error> for HarvestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HarvestError::Timeout(e)
        } else {
            HarvestError::Http(e)
        }
    }
}

/// Unrecoverable failures that move the pipeline into its `Failed` stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("aborted after write failure (stop-on-error): {0}")]
    WriteAborted(WriteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_classifies_permission_denied() {
        let err = WriteError::from_io(
            PathBuf::from("public/index.html"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, WriteError::PermissionDenied { .. }));
    }

    #[test]
    fn test_write_error_classifies_directory_as_collision() {
        let err = WriteError::from_io(
            PathBuf::from("public/product_1.html"),
            io::Error::from(io::ErrorKind::IsADirectory),
        );
        assert!(matches!(err, WriteError::PathCollision { .. }));
    }

    #[test]
    fn test_write_error_falls_back_to_io() {
        let err = WriteError::from_io(
            PathBuf::from("public/index.html"),
            io::Error::other("boom"),
        );
        assert!(matches!(err, WriteError::Io { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_store_missing_message_names_path() {
        let err = StoreError::Missing {
            path: PathBuf::from("ai_products.json"),
        };
        assert_eq!(err.to_string(), "offer store not found: ai_products.json");
    }
}
