//! Reading and writing the offer store.
//!
//! The store is a JSON array of [`OfferRecord`] objects, the format written by
//! the generator (and by older tooling as `ai_products.json`). Loading only
//! validates the outer shape; each record's embedded solution is parsed later
//! so that a bad payload affects that one record only.

use crate::error::StoreError;
use crate::models::OfferRecord;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Load every offer record from `path`.
///
/// # Errors
///
/// - [`StoreError::Missing`] if the file does not exist
/// - [`StoreError::Malformed`] if it is not a JSON array of offer records
/// - [`StoreError::Io`] for any other read failure
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_offers(path: &Path) -> Result<Vec<OfferRecord>, StoreError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    debug!(bytes = raw.len(), "Read offer store");

    let records: Vec<OfferRecord> =
        serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    info!(count = records.len(), "Loaded offer records");
    Ok(records)
}

/// Write `records` to `path` as indented JSON, replacing any previous store.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn save_offers(path: &Path, records: &[OfferRecord]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).await.map_err(io_err)?;
    info!("Wrote offer store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(pain_point: &str) -> OfferRecord {
        OfferRecord {
            pain_point: pain_point.to_string(),
            solution: r#"{"product":"P","description":"D","monetization":"M"}"#.to_string(),
            created_at: "2025-06-21T12:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_valid_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ai_products.json");
        std::fs::write(
            &path,
            r#"[{"pain_point":"How do I get clients?","solution":"not even json","created_at":"2025-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let records = load_offers(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pain_point, "How do I get clients?");
        assert_eq!(records[0].solution, "not even json");
    }

    #[tokio::test]
    async fn test_missing_store() {
        let dir = TempDir::new().unwrap();
        let err = load_offers(&dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
    }

    #[tokio::test]
    async fn test_malformed_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ai_products.json");
        std::fs::write(&path, "[{\"pain_point\": ").unwrap();

        let err = load_offers(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_store_must_be_a_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ai_products.json");
        std::fs::write(&path, r#"{"pain_point":"x","solution":"y","created_at":"z"}"#).unwrap();

        let err = load_offers(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_record_missing_field_is_malformed_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ai_products.json");
        std::fs::write(&path, r#"[{"pain_point":"x","created_at":"z"}]"#).unwrap();

        let err = load_offers(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/ai_products.json");
        let records = vec![record("first"), record("second")];

        save_offers(&path, &records).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n  {"));

        assert_eq!(load_offers(&path).await.unwrap(), records);
    }
}
