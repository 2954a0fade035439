//! Stage click-derived zoom regions for the next editor session.

use std::path::Path;

use screenverse_processing_core::auto_zoom::AutoZoomAnalyzer;
use screenverse_project_model::event::parse_clicks;
use screenverse_project_model::import::ImportBuffer;

pub fn run(clips_dir: &Path, path: &Path, duration: Option<f64>) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| anyhow::anyhow!("Clicks file not found: {}", path.display()))?;
    let clicks =
        parse_clicks(&content).map_err(|e| anyhow::anyhow!("Failed to parse clicks: {e}"))?;
    println!("  Loaded {} clicks", clicks.len());

    let regions = AutoZoomAnalyzer::with_defaults().analyze(&clicks, duration);
    let buffer = ImportBuffer::in_dir(clips_dir);
    buffer
        .stage(&regions)
        .map_err(|e| anyhow::anyhow!("Failed to stage regions: {e}"))?;

    if regions.is_empty() {
        println!("  No zoom regions derived; import buffer cleared.");
    } else {
        println!(
            "  Staged {} zoom regions in {}",
            regions.len(),
            buffer.path().display()
        );
        for region in &regions {
            println!("    {:<20} {:>8.3}s - {:>8.3}s", region.id, region.start, region.end);
        }
    }
    Ok(())
}
