//! Clip store commands.

use std::path::Path;

use screenverse_project_model::import::ImportBuffer;
use screenverse_project_model::store::{ClipMetadata, ClipStore, FsClipStore};

pub fn list(clips_dir: &Path) -> anyhow::Result<()> {
    let store = FsClipStore::new(clips_dir);
    let clips = store
        .list_clips()
        .map_err(|e| anyhow::anyhow!("Failed to list clips: {e}"))?;

    if clips.is_empty() {
        println!("No clips in {}", clips_dir.display());
        return Ok(());
    }

    println!("{:<36}  {:<19}  {:>8}  {:>10}  TITLE", "ID", "CREATED", "LENGTH", "SIZE");
    for clip in &clips {
        println!(
            "{:<36}  {:<19}  {:>8}  {:>10}  {}",
            clip.id,
            clip.created_at.format("%Y-%m-%d %H:%M:%S"),
            format_duration(clip.duration_secs),
            format_size(clip.size_bytes),
            clip.title
        );
    }
    Ok(())
}

pub fn info(clips_dir: &Path, id: &str) -> anyhow::Result<()> {
    let store = FsClipStore::new(clips_dir);
    let clip = store
        .metadata(id)
        .map_err(|e| anyhow::anyhow!("Failed to load clip: {e}"))?;
    print_metadata(&clip);

    let pending = ImportBuffer::in_dir(clips_dir);
    if pending.path().exists() {
        println!();
        println!("Pending zoom import: {}", pending.path().display());
    }
    Ok(())
}

pub fn rename(clips_dir: &Path, id: &str, title: &str) -> anyhow::Result<()> {
    let store = FsClipStore::new(clips_dir);
    let clip = store
        .rename_clip(id, title)
        .map_err(|e| anyhow::anyhow!("Failed to rename clip: {e}"))?;
    println!("Renamed {} to \"{}\"", clip.id, clip.title);
    Ok(())
}

pub fn delete(clips_dir: &Path, id: &str) -> anyhow::Result<()> {
    let store = FsClipStore::new(clips_dir);
    store
        .delete_clip(id)
        .map_err(|e| anyhow::anyhow!("Failed to delete clip: {e}"))?;
    println!("Deleted {id}");
    Ok(())
}

fn print_metadata(clip: &ClipMetadata) {
    println!("Clip: {}", clip.title);
    println!("  ID: {}", clip.id);
    println!("  Created: {}", clip.created_at.to_rfc3339());
    println!("  Duration: {}", format_duration(clip.duration_secs));
    println!("  Size: {} ({} bytes)", format_size(clip.size_bytes), clip.size_bytes);
    println!("  Type: {}", clip.mime_type);
    println!("  Thumbnail: {}", if clip.has_thumbnail { "yes" } else { "no" });
}

fn format_duration(secs: Option<f64>) -> String {
    match secs {
        Some(secs) => {
            let total = secs.round() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        None => "?".to_string(),
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
