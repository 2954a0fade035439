//! One-shot hand-off of externally produced regions to the editor.
//!
//! The recorder stages candidate zoom regions into a JSON file; the next
//! editor to open takes them and removes the file so a reload never merges
//! the same regions twice.

use std::path::{Path, PathBuf};

use crate::region::Region;
use crate::store::StoreError;

/// File name of the buffer inside the clip store root.
pub const IMPORT_BUFFER_FILE: &str = "pending-regions.json";

/// Persistent buffer of regions awaiting merge.
#[derive(Debug, Clone)]
pub struct ImportBuffer {
    path: PathBuf,
}

impl ImportBuffer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Buffer that lives beside the clips under `clips_dir`.
    pub fn in_dir(clips_dir: &Path) -> Self {
        Self::new(clips_dir.join(IMPORT_BUFFER_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the buffer contents. An empty list clears the buffer.
    pub fn stage(&self, regions: &[Region]) -> Result<(), StoreError> {
        if regions.is_empty() {
            return self.clear();
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(regions).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(count = regions.len(), path = %self.path.display(), "Staged regions for import");
        Ok(())
    }

    /// Read and remove the staged regions.
    ///
    /// A missing buffer yields an empty list. A corrupt buffer is logged,
    /// removed, and also yields an empty list.
    pub fn take(&self) -> Result<Vec<Region>, StoreError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        self.clear()?;

        match serde_json::from_str::<Vec<Region>>(&json) {
            Ok(regions) => Ok(regions),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable import buffer");
                Ok(Vec::new())
            }
        }
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{RegionKind, ZoomCenter, ZoomOrigin, ZoomSettings};

    fn temp_buffer(name: &str) -> ImportBuffer {
        let dir = std::env::temp_dir().join(format!(
            "screenverse_import_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        ImportBuffer::in_dir(&dir)
    }

    fn zoom(id: &str, start: f64) -> Region {
        Region {
            id: id.to_string(),
            kind: RegionKind::Zoom(ZoomSettings {
                center: ZoomCenter::new(20.0, 80.0),
                level: 1.5,
                origin: ZoomOrigin::RecordedClicks,
            }),
            start,
            end: start + 0.4,
        }
    }

    #[test]
    fn test_take_consumes_exactly_once() {
        let buffer = temp_buffer("once");
        let regions = vec![zoom("zoom-mouse-100", 0.0), zoom("zoom-mouse-2000", 1.9)];
        buffer.stage(&regions).unwrap();

        assert_eq!(buffer.take().unwrap(), regions);
        assert!(buffer.take().unwrap().is_empty());
        assert!(!buffer.path().exists());

        std::fs::remove_dir_all(buffer.path().parent().unwrap()).ok();
    }

    #[test]
    fn test_staging_nothing_clears_previous_buffer() {
        let buffer = temp_buffer("clear");
        buffer.stage(&[zoom("zoom-mouse-1", 0.0)]).unwrap();
        buffer.stage(&[]).unwrap();
        assert!(buffer.take().unwrap().is_empty());
        std::fs::remove_dir_all(buffer.path().parent().unwrap()).ok();
    }

    #[test]
    fn test_corrupt_buffer_is_discarded() {
        let buffer = temp_buffer("corrupt");
        std::fs::create_dir_all(buffer.path().parent().unwrap()).unwrap();
        std::fs::write(buffer.path(), "[{").unwrap();

        assert!(buffer.take().unwrap().is_empty());
        assert!(!buffer.path().exists());
        std::fs::remove_dir_all(buffer.path().parent().unwrap()).ok();
    }
}
