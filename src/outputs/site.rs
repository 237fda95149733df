//! Writing rendered pages into the output directory.
//!
//! Every write overwrites whatever is at the target path, so re-running with
//! the same input leaves byte-identical files behind. Detail pages from an
//! earlier, larger run are removed by [`prune_stale_pages`].

use super::page_number;
use crate::error::WriteError;
use crate::models::RenderedPage;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Outcome of [`prune_stale_pages`].
#[derive(Debug, Default)]
pub struct PruneOutcome {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<WriteError>,
}

/// Create `dir` (and parents) if it does not exist yet.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn ensure_output_dir(dir: &Path) -> Result<(), WriteError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| WriteError::from_io(dir.to_path_buf(), e))?;
    debug!("Output directory ready");
    Ok(())
}

/// Write `page` to `dir/page.relative_path`, replacing any existing file.
///
/// # Errors
///
/// - [`WriteError::InvalidPath`] if the relative path is absolute or climbs
///   out of `dir`
/// - [`WriteError::PathCollision`] if a directory occupies the target path
/// - any other [`WriteError`] classified from the underlying I/O failure
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), page = %page.relative_path))]
pub async fn write_page(dir: &Path, page: &RenderedPage) -> Result<PathBuf, WriteError> {
    let relative = Path::new(&page.relative_path);
    let contained = relative.components().count() > 0
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !contained {
        return Err(WriteError::InvalidPath {
            relative: page.relative_path.clone(),
        });
    }

    let path = dir.join(relative);
    if let Ok(meta) = fs::metadata(&path).await {
        if meta.is_dir() {
            return Err(WriteError::PathCollision {
                path,
                detail: "a directory exists at the target path".to_string(),
            });
        }
    }

    fs::write(&path, page.content.as_bytes())
        .await
        .map_err(|e| WriteError::from_io(path.clone(), e))?;
    info!(path = %path.display(), bytes = page.content.len(), "Wrote page");
    Ok(path)
}

/// Remove detail pages (`product_<n>.html`) in `dir` whose names are not in
/// `keep`. Other files are left alone.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), keep = keep.len()))]
pub async fn prune_stale_pages(dir: &Path, keep: &[String]) -> PruneOutcome {
    let mut outcome = PruneOutcome::default();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            outcome.failures.push(WriteError::from_io(dir.to_path_buf(), e));
            return outcome;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                outcome.failures.push(WriteError::from_io(dir.to_path_buf(), e));
                break;
            }
        };

        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if page_number(name).is_none() || keep.iter().any(|k| k == name) {
            continue;
        }
        match entry.file_type().await {
            Ok(ft) if ft.is_file() => {}
            _ => continue,
        }

        let path = entry.path();
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Removed stale page");
                outcome.removed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove stale page");
                outcome.failures.push(WriteError::from_io(path, e));
            }
        }
    }

    outcome.removed.sort();
    outcome
}
