//! Clip persistence.
//!
//! Every clip lives in its own directory under the store root:
//!
//! ```text
//! <root>/<id>/clip.bin        encoded media
//! <root>/<id>/meta.json       ClipMetadata
//! <root>/<id>/thumbnail.png   optional first-frame snapshot
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MEDIA_FILE: &str = "clip.bin";
const META_FILE: &str = "meta.json";
const THUMBNAIL_FILE: &str = "thumbnail.png";

/// Stored description of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMetadata {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,

    /// `None` when the recorder could not report a finite duration.
    #[serde(default)]
    pub duration_secs: Option<f64>,

    pub size_bytes: u64,
    pub mime_type: String,

    #[serde(default)]
    pub has_thumbnail: bool,
}

/// Optional attributes supplied when saving a clip.
#[derive(Debug, Clone, Default)]
pub struct SaveClipOptions {
    pub title: Option<String>,
    pub duration_secs: Option<f64>,
    pub mime_type: Option<String>,
    pub thumbnail_png: Option<Vec<u8>>,
}

/// A loaded clip.
#[derive(Debug, Clone)]
pub struct StoredClip {
    pub metadata: ClipMetadata,
    pub data: Vec<u8>,
}

/// Errors raised by clip stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Clip not found: {id}")]
    ClipNotFound { id: String },

    #[error("Invalid clip title: {reason}")]
    InvalidTitle { reason: String },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn parse(path: &Path, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Storage for recorded clips.
pub trait ClipStore: Send + Sync {
    /// Persist `data` and return the new clip's metadata.
    fn save_clip(&self, data: &[u8], options: SaveClipOptions) -> Result<ClipMetadata, StoreError>;

    fn load_clip(&self, id: &str) -> Result<StoredClip, StoreError>;

    fn metadata(&self, id: &str) -> Result<ClipMetadata, StoreError>;

    /// All clips, newest first.
    fn list_clips(&self) -> Result<Vec<ClipMetadata>, StoreError>;

    fn delete_clip(&self, id: &str) -> Result<(), StoreError>;

    fn rename_clip(&self, id: &str, title: &str) -> Result<ClipMetadata, StoreError>;

    /// Thumbnail bytes, if one was saved.
    fn thumbnail(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Directory-backed [`ClipStore`].
#[derive(Debug, Clone)]
pub struct FsClipStore {
    root: PathBuf,
}

impl FsClipStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn clip_dir(&self, id: &str) -> Result<PathBuf, StoreError> {
        // Ids are generated by the store; anything path-like cannot exist.
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(StoreError::ClipNotFound { id: id.to_string() });
        }
        Ok(self.root.join(id))
    }

    fn existing_dir(&self, id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.clip_dir(id)?;
        if !dir.join(META_FILE).exists() {
            return Err(StoreError::ClipNotFound { id: id.to_string() });
        }
        Ok(dir)
    }

    fn read_metadata(&self, dir: &Path) -> Result<ClipMetadata, StoreError> {
        let path = dir.join(META_FILE);
        let json = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        serde_json::from_str(&json).map_err(|e| StoreError::parse(&path, e))
    }

    fn write_metadata(&self, dir: &Path, metadata: &ClipMetadata) -> Result<(), StoreError> {
        let path = dir.join(META_FILE);
        let json =
            serde_json::to_string_pretty(metadata).map_err(|e| StoreError::parse(&path, e))?;
        std::fs::write(&path, json).map_err(|e| StoreError::io(&path, e))
    }

    fn save_clip_as(
        &self,
        id: String,
        data: &[u8],
        options: SaveClipOptions,
    ) -> Result<ClipMetadata, StoreError> {
        let title = match options.title.as_deref() {
            Some(title) => validated_title(title)?,
            None => String::new(),
        };

        let dir = self.clip_dir(&id)?;
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let metadata = match self.write_clip_files(&dir, id, title, data, options) {
            Ok(metadata) => metadata,
            Err(err) => {
                // No half-written clip directories.
                if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                    tracing::warn!(path = %dir.display(), error = %cleanup, "Failed to remove partial clip");
                }
                return Err(err);
            }
        };

        tracing::info!(
            id = %metadata.id,
            bytes = metadata.size_bytes,
            duration = ?metadata.duration_secs,
            "Clip saved"
        );
        Ok(metadata)
    }

    fn write_clip_files(
        &self,
        dir: &Path,
        id: String,
        title: String,
        data: &[u8],
        options: SaveClipOptions,
    ) -> Result<ClipMetadata, StoreError> {
        let media_path = dir.join(MEDIA_FILE);
        std::fs::write(&media_path, data).map_err(|e| StoreError::io(&media_path, e))?;

        let has_thumbnail = match options.thumbnail_png {
            Some(png) => {
                let path = dir.join(THUMBNAIL_FILE);
                std::fs::write(&path, png).map_err(|e| StoreError::io(&path, e))?;
                true
            }
            None => false,
        };

        let created_at = Utc::now();
        let metadata = ClipMetadata {
            id,
            title: if title.is_empty() {
                default_title(created_at)
            } else {
                title
            },
            created_at,
            duration_secs: options.duration_secs.filter(|d| d.is_finite() && *d >= 0.0),
            size_bytes: data.len() as u64,
            mime_type: options
                .mime_type
                .unwrap_or_else(|| "video/webm".to_string()),
            has_thumbnail,
        };
        self.write_metadata(dir, &metadata)?;
        Ok(metadata)
    }
}

impl ClipStore for FsClipStore {
    fn save_clip(&self, data: &[u8], options: SaveClipOptions) -> Result<ClipMetadata, StoreError> {
        self.save_clip_as(new_clip_id(), data, options)
    }

    fn load_clip(&self, id: &str) -> Result<StoredClip, StoreError> {
        let dir = self.existing_dir(id)?;
        let metadata = self.read_metadata(&dir)?;
        let media_path = dir.join(MEDIA_FILE);
        let data = std::fs::read(&media_path).map_err(|e| StoreError::io(&media_path, e))?;
        Ok(StoredClip { metadata, data })
    }

    fn metadata(&self, id: &str) -> Result<ClipMetadata, StoreError> {
        let dir = self.existing_dir(id)?;
        self.read_metadata(&dir)
    }

    fn list_clips(&self) -> Result<Vec<ClipMetadata>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;

        let mut clips = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let dir = entry.path();
            if !dir.join(META_FILE).is_file() {
                continue;
            }
            match self.read_metadata(&dir) {
                Ok(metadata) => clips.push(metadata),
                Err(e) => tracing::warn!(path = %dir.display(), error = %e, "Skipping unreadable clip"),
            }
        }

        clips.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(clips)
    }

    fn delete_clip(&self, id: &str) -> Result<(), StoreError> {
        let dir = self.existing_dir(id)?;
        std::fs::remove_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tracing::info!(id, "Clip deleted");
        Ok(())
    }

    fn rename_clip(&self, id: &str, title: &str) -> Result<ClipMetadata, StoreError> {
        let title = validated_title(title)?;
        let dir = self.existing_dir(id)?;
        let mut metadata = self.read_metadata(&dir)?;
        metadata.title = title;
        self.write_metadata(&dir, &metadata)?;
        Ok(metadata)
    }

    fn thumbnail(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let dir = self.existing_dir(id)?;
        let path = dir.join(THUMBNAIL_FILE);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read(&path)
            .map(Some)
            .map_err(|e| StoreError::io(&path, e))
    }
}

fn validated_title(title: &str) -> Result<String, StoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidTitle {
            reason: "title must not be blank".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn default_title(created_at: DateTime<Utc>) -> String {
    format!("Recording {}", created_at.format("%Y-%m-%d %H:%M:%S"))
}

/// Generate a UUID-v4-shaped id from the clock and a process-wide counter.
fn new_clip_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) as u128;
    let seed = nanos ^ (seq.wrapping_mul(0x9E37_79B9_7F4A_7C15) << 17) ^ (std::process::id() as u128) << 96;

    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (seed & 0xFFFF_FFFF) as u32,
        ((seed >> 32) & 0xFFFF) as u16,
        ((seed >> 48) & 0x0FFF) as u16,
        (((seed >> 60) & 0x3FFF) as u16) | 0x8000,
        (seed >> 76) & 0xFFFF_FFFF_FFFF,
    )
}
